//! Cloudflare Exporter - Connectors
//!
//! Clients for the two Cloudflare collaborators the ingestion engine talks
//! to: the REST zone list and the GraphQL analytics API.
//!
//! # Overview
//!
//! - [`AnalyticsClient`]: the trait the ingestion engine is written
//!   against; tests substitute in-memory fakes
//! - [`Cloudflare`]: the real implementation over `reqwest`
//! - [`Dataset`]: the three analytics query kinds and their templates
//! - [`ConnectorError`]: typed failures, with rate limiting classified
//!   here so callers never inspect error text
//!
//! # Example
//!
//! ```ignore
//! use cfx_connectors::{AnalyticsClient, Cloudflare, Dataset};
//!
//! let cloudflare = Cloudflare::from_config(&config.cloudflare, Duration::from_secs(30))?;
//! for zone in cloudflare.list_zones().await? {
//!     let page = cloudflare.query_zone(Dataset::HttpRequests, &zone.id, start, 10_000).await?;
//! }
//! ```

mod cloudflare;
mod dataset;
mod error;
mod traits;
pub mod types;

pub use cloudflare::Cloudflare;
pub use dataset::Dataset;
pub use error::ConnectorError;
pub use traits::AnalyticsClient;
pub use types::{Zone, ZoneAnalytics};
