//! Metric store
//!
//! One explicit registry built at startup and handed to both the ingestion
//! engine and the exposition handler.

use std::fmt;
use std::time::Duration;

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::debug;

use crate::error::Result;
use crate::exporter::ExporterMetrics;
use crate::zones::ZoneMetrics;

/// Registry plus typed handles to every family in it
#[derive(Clone)]
pub struct MetricStore {
    registry: Registry,
    zones: ZoneMetrics,
    exporter: ExporterMetrics,
}

impl fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricStore")
            .field("zones", &self.zones)
            .field("exporter", &self.exporter)
            .finish_non_exhaustive()
    }
}

impl MetricStore {
    /// Build and register every family
    ///
    /// `staleness` is the age past which timestamped zone samples are
    /// withheld from exposition.
    pub fn new(staleness: Duration) -> Result<Self> {
        let registry = Registry::new();
        let zones = ZoneMetrics::new(staleness)?;
        let exporter = ExporterMetrics::new()?;

        zones.register(&registry)?;
        exporter.register(&registry)?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        debug!(staleness = ?staleness, "metric store initialized");

        Ok(Self {
            registry,
            zones,
            exporter,
        })
    }

    pub fn zones(&self) -> &ZoneMetrics {
        &self.zones
    }

    pub fn exporter(&self) -> &ExporterMetrics {
        &self.exporter
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Encode every family in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type of [`render`](Self::render) output
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneMetric;
    use chrono::{TimeDelta, Utc};

    fn store() -> MetricStore {
        MetricStore::new(Duration::from_secs(15 * 60)).unwrap()
    }

    #[test]
    fn test_render_includes_exporter_metrics() {
        let store = store();
        store.exporter().scrapes.inc();

        let text = store.render().unwrap();
        assert!(text.contains("cloudflare_exporter_cloudflare_scrapes_total 1"));
        assert!(text.contains("cloudflare_exporter_build_info{version="));
        assert!(text.contains("cloudflare_zones_active_count 0"));
    }

    #[test]
    fn test_render_includes_timestamped_sample() {
        let store = store();
        let observed = Utc::now() - TimeDelta::minutes(2);
        store
            .zones()
            .add(ZoneMetric::HttpCountryRequests, &["example.com", "GB"], 30.0, observed)
            .unwrap();

        let text = store.render().unwrap();
        let expected = format!(
            "cloudflare_zones_http_country_requests_total{{client_country_name=\"GB\",zone=\"example.com\"}} 30 {}",
            observed.timestamp_millis()
        );
        assert!(text.contains(&expected), "missing line in:\n{}", text);
    }

    #[test]
    fn test_render_omits_stale_sample() {
        let store = store();
        let observed = Utc::now() - TimeDelta::minutes(20);
        store
            .zones()
            .add(ZoneMetric::HttpCachedBytes, &["example.com"], 1024.0, observed)
            .unwrap();

        let text = store.render().unwrap();
        assert!(!text.contains("cloudflare_zones_http_cached_bytes_total{"));
    }

    #[test]
    fn test_independent_stores() {
        let a = store();
        let b = store();
        a.exporter().scrape_errors.inc();
        assert_eq!(a.exporter().scrape_errors.get(), 1);
        assert_eq!(b.exporter().scrape_errors.get(), 0);
    }

    #[test]
    fn test_content_type() {
        assert!(store().content_type().starts_with("text/plain"));
    }
}
