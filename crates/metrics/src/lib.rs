//! Cloudflare Exporter - Metrics
//!
//! Timestamped metric families and the Prometheus registry they are exposed
//! through.
//!
//! # Overview
//!
//! - [`TimestampedMetricVec`]: counter/gauge family whose points carry the
//!   time of the observation they represent, withheld once that
//!   observation is older than a staleness cutoff
//! - [`ZoneMetrics`]: the per-zone analytics families
//! - [`ExporterMetrics`]: the exporter's own scrape/backoff counters
//! - [`MetricStore`]: explicit registry owning all of the above, rendered
//!   in the Prometheus text format
//!
//! # Sharing
//!
//! Every handle is `Clone` and clones share state. The store is built once
//! at startup and passed to both the ingestion scheduler and the HTTP
//! handler; there is no global registry.
//!
//! ```ignore
//! use std::time::Duration;
//! use cfx_metrics::{MetricStore, ZoneMetric};
//!
//! let store = MetricStore::new(Duration::from_secs(900))?;
//! store.zones().add(ZoneMetric::HttpCachedRequests, &["example.com"], 12.0, observed_at)?;
//! let body = store.render()?;
//! ```

pub mod error;
pub mod exporter;
pub mod store;
pub mod timestamped;
pub mod zones;

pub use error::{MetricsError, Result};
pub use exporter::ExporterMetrics;
pub use store::MetricStore;
pub use timestamped::{DEFAULT_MAX_AGE, MetricOpts, Sample, TimestampedMetricVec, ValueKind};
pub use zones::{ZoneMetric, ZoneMetrics};
