//! Scrape configuration
//!
//! Controls how often Cloudflare is polled and how the analytics query
//! windows are bounded.
//!
//! # Defaults
//!
//! - `interval`: 60s
//! - `timeout`: 30s
//! - `max_page_size`: 10000
//! - `grace_period`: 5m
//! - `max_window`: 1h
//! - `staleness`: 15m

use serde::Deserialize;
use std::time::Duration;

/// Scrape configuration
///
/// # Example
///
/// ```toml
/// [scrape]
/// interval = "60s"
/// timeout = "30s"
/// max_page_size = 10000
/// grace_period = "5m"
/// max_window = "1h"
/// staleness = "15m"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Time between ingestion passes. Also the lookback used the first
    /// time a zone/dataset pair is queried.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Deadline for one whole ingestion pass
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Records requested per analytics query. A page of exactly this size
    /// is followed by another query anchored at the new watermark.
    pub max_page_size: u32,

    /// How far before the watermark each query starts
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,

    /// Oldest a watermark may fall behind the current time
    #[serde(with = "humantime_serde")]
    pub max_window: Duration,

    /// Samples observed longer ago than this are withheld from exposition
    #[serde(with = "humantime_serde")]
    pub staleness: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            max_page_size: 10_000,
            grace_period: Duration::from_secs(5 * 60),
            max_window: Duration::from_secs(60 * 60),
            staleness: Duration::from_secs(15 * 60),
        }
    }
}
