//! Collaborator trait consumed by the ingestion engine

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::dataset::Dataset;
use crate::error::ConnectorError;
use crate::types::{Zone, ZoneAnalytics};

/// Source of zones and analytics pages
///
/// Implemented by [`Cloudflare`](crate::Cloudflare) for the real APIs and by
/// in-memory fakes in tests.
pub trait AnalyticsClient: Send + Sync {
    /// Active (non-pending) zones from the first page of the zone list
    fn list_zones(&self) -> impl Future<Output = Result<Vec<Zone>, ConnectorError>> + Send;

    /// One page of `dataset` for a zone
    ///
    /// Records have `datetime > start`, ascending, at most `limit` of them.
    /// The returned vector holds one entry per zone the API matched, which
    /// for a zone-tag filter should be exactly one.
    fn query_zone(
        &self,
        dataset: Dataset,
        zone_id: &str,
        start: DateTime<Utc>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ZoneAnalytics>, ConnectorError>> + Send;
}
