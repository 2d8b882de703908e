//! Exporter self-metrics
//!
//! Plain (untimestamped) counters and gauges describing the exporter's own
//! behaviour: scrape passes, failures, backoff and the active zone count.

use std::fmt;

use prometheus::{Gauge, IntCounter, IntGauge, IntGaugeVec, Opts, Registry};

use crate::error::Result;

const NAMESPACE: &str = "cloudflare";

/// Handles to the exporter's own metrics
///
/// All fields are cheap to clone and safe to update from any task.
#[derive(Clone)]
pub struct ExporterMetrics {
    /// Ingestion passes started
    pub scrapes: IntCounter,
    /// Ingestion passes that ended in an error
    pub scrape_errors: IntCounter,
    /// Ingestion passes that ended in a rate-limit error
    pub rate_limit_errors: IntCounter,
    /// Ticks suppressed by rate-limit backoff
    pub skipped_scrapes: IntCounter,
    /// Wall time of the most recent pass
    pub last_scrape_duration: Gauge,
    /// Zones returned by the most recent zone lookup
    pub zones_active: IntGauge,
    build_info: IntGaugeVec,
}

impl fmt::Debug for ExporterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterMetrics")
            .field("scrapes", &self.scrapes.get())
            .field("scrape_errors", &self.scrape_errors.get())
            .field("rate_limit_errors", &self.rate_limit_errors.get())
            .field("skipped_scrapes", &self.skipped_scrapes.get())
            .field("zones_active", &self.zones_active.get())
            .finish_non_exhaustive()
    }
}

impl ExporterMetrics {
    pub fn new() -> Result<Self> {
        let exporter = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(NAMESPACE)
                .subsystem("exporter")
        };

        let metrics = Self {
            scrapes: IntCounter::with_opts(exporter(
                "cloudflare_scrapes_total",
                "Number of times the Cloudflare API was scraped",
            ))?,
            scrape_errors: IntCounter::with_opts(exporter(
                "cloudflare_scrape_errors_total",
                "Number of scrapes of the Cloudflare API that failed",
            ))?,
            rate_limit_errors: IntCounter::with_opts(exporter(
                "cloudflare_rate_limit_errors_total",
                "Number of scrapes rejected by the Cloudflare API rate limit",
            ))?,
            skipped_scrapes: IntCounter::with_opts(exporter(
                "skipped_scrapes_total",
                "Number of scheduled scrapes skipped while backing off",
            ))?,
            last_scrape_duration: Gauge::with_opts(exporter(
                "last_scrape_duration_seconds",
                "Duration of the most recent scrape",
            ))?,
            zones_active: IntGauge::with_opts(
                Opts::new("active_count", "Number of active zones")
                    .namespace(NAMESPACE)
                    .subsystem("zones"),
            )?,
            build_info: IntGaugeVec::new(
                exporter("build_info", "Build information for the exporter"),
                &["version"],
            )?,
        };

        metrics
            .build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1);

        Ok(metrics)
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.scrapes.clone()))?;
        registry.register(Box::new(self.scrape_errors.clone()))?;
        registry.register(Box::new(self.rate_limit_errors.clone()))?;
        registry.register(Box::new(self.skipped_scrapes.clone()))?;
        registry.register(Box::new(self.last_scrape_duration.clone()))?;
        registry.register(Box::new(self.zones_active.clone()))?;
        registry.register(Box::new(self.build_info.clone()))?;
        Ok(())
    }
}
