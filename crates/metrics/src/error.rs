//! Metrics errors

use thiserror::Error;

/// Errors raised while defining, updating or rendering metrics
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Invalid name, duplicate registration, or encoder failure
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Wrong number of label values for a family
    #[error("metric '{metric}' expects {expected} label values, got {actual}")]
    LabelCardinality {
        metric: String,
        expected: usize,
        actual: usize,
    },

    /// Exposition output was not valid UTF-8
    #[error("exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_display() {
        let err = MetricsError::LabelCardinality {
            metric: "cloudflare_zones_http_cached_requests_total".into(),
            expected: 1,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "metric 'cloudflare_zones_http_cached_requests_total' expects 1 label values, got 3"
        );
    }
}
