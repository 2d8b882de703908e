//! Ingestion errors

use std::time::Duration;

use cfx_connectors::ConnectorError;
use cfx_metrics::MetricsError;
use thiserror::Error;

/// Errors that abort a page, a zone/dataset pair or a whole pass
#[derive(Error, Debug)]
pub enum IngestError {
    /// Zone lookup or analytics query failed
    #[error(transparent)]
    Source(#[from] ConnectorError),

    /// A record's `datetime` is not RFC 3339
    #[error("malformed timestamp '{value}': {source}")]
    MalformedTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    /// A zone-filtered query matched other than one zone
    #[error("expected exactly one zone in response for '{zone}', got {count}")]
    UnexpectedZoneCount { zone: String, count: usize },

    /// The whole pass exceeded its deadline
    #[error("scrape timed out after {0:?}")]
    Timeout(Duration),

    /// A delta could not be written to the store
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

impl IngestError {
    /// True when the underlying request was rejected by a rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Source(e) if e.is_rate_limited())
    }
}

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;
