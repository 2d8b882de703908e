//! Plain values the ingestion engine runs with

use std::time::Duration;

use cfx_config::ScrapeConfig;
use chrono::{DateTime, TimeDelta, Utc};

/// Scrape tunables, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    /// Tick period, and the lookback for a watermark seen for the first time
    pub interval: Duration,
    /// Deadline for a whole pass
    pub timeout: Duration,
    /// Records per analytics query
    pub max_page_size: u32,
    /// How far before the watermark a query starts
    pub grace_period: Duration,
    /// Oldest a watermark may trail the current time
    pub max_window: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self::from(&ScrapeConfig::default())
    }
}

impl From<&ScrapeConfig> for ScrapeSettings {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            interval: config.interval,
            timeout: config.timeout,
            max_page_size: config.max_page_size,
            grace_period: config.grace_period,
            max_window: config.max_window,
        }
    }
}

/// `at - span`, saturating at the earliest representable time
pub(crate) fn before(at: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(span)
        .ok()
        .and_then(|delta| at.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
