//! Per-zone analytics families
//!
//! Every family is a timestamped counter under `cloudflare_zones_*` with a
//! `zone` label carrying the zone's display name.

use std::time::Duration;

use chrono::{DateTime, Utc};
use prometheus::Registry;

use crate::error::Result;
use crate::timestamped::{MetricOpts, TimestampedMetricVec, ValueKind};

const NAMESPACE: &str = "cloudflare";
const SUBSYSTEM: &str = "zones";

/// Zone-level metric families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneMetric {
    HttpCountryRequests,
    HttpCountryThreats,
    HttpCountryBytes,
    HttpCachedRequests,
    HttpCachedBytes,
    HttpProtocolRequests,
    HttpResponses,
    HttpThreats,
    FirewallEvents,
    HealthCheckEvents,
}

impl ZoneMetric {
    pub const ALL: [ZoneMetric; 10] = [
        Self::HttpCountryRequests,
        Self::HttpCountryThreats,
        Self::HttpCountryBytes,
        Self::HttpCachedRequests,
        Self::HttpCachedBytes,
        Self::HttpProtocolRequests,
        Self::HttpResponses,
        Self::HttpThreats,
        Self::FirewallEvents,
        Self::HealthCheckEvents,
    ];

    /// Name without the `cloudflare_zones_` prefix
    pub fn name(self) -> &'static str {
        match self {
            Self::HttpCountryRequests => "http_country_requests_total",
            Self::HttpCountryThreats => "http_country_threats_total",
            Self::HttpCountryBytes => "http_country_bytes_total",
            Self::HttpCachedRequests => "http_cached_requests_total",
            Self::HttpCachedBytes => "http_cached_bytes_total",
            Self::HttpProtocolRequests => "http_protocol_requests_total",
            Self::HttpResponses => "http_responses_total",
            Self::HttpThreats => "http_threats_total",
            Self::FirewallEvents => "firewall_events_total",
            Self::HealthCheckEvents => "health_check_events_total",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::HttpCountryRequests => "Number of HTTP requests by country",
            Self::HttpCountryThreats => "Number of HTTP threats by country",
            Self::HttpCountryBytes => "Number of HTTP bytes by country",
            Self::HttpCachedRequests => "Number of cached HTTP requests",
            Self::HttpCachedBytes => "Number of cached HTTP bytes",
            Self::HttpProtocolRequests => "Number of HTTP requests by protocol",
            Self::HttpResponses => "Number of HTTP responses by edge status",
            Self::HttpThreats => "Number of HTTP threats by pathing type",
            Self::FirewallEvents => "Number of firewall events",
            Self::HealthCheckEvents => "Number of health check events",
        }
    }

    /// Label names, always starting with `zone`
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Self::HttpCountryRequests | Self::HttpCountryThreats | Self::HttpCountryBytes => {
                &["zone", "client_country_name"]
            }
            Self::HttpCachedRequests | Self::HttpCachedBytes => &["zone"],
            Self::HttpProtocolRequests => &["zone", "client_http_protocol"],
            Self::HttpResponses => &["zone", "edge_response_status"],
            Self::HttpThreats => &["zone", "threat_pathing_name"],
            Self::FirewallEvents => &["zone", "action", "source", "rule_id"],
            Self::HealthCheckEvents => &[
                "zone",
                "failure_reason",
                "health_check_name",
                "health_status",
                "origin_response_status",
                "region",
                "scope",
            ],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// All zone families, sharing one staleness cutoff
#[derive(Debug, Clone)]
pub struct ZoneMetrics {
    families: Vec<TimestampedMetricVec>,
}

impl ZoneMetrics {
    pub fn new(staleness: Duration) -> Result<Self> {
        let families = ZoneMetric::ALL
            .iter()
            .map(|metric| {
                TimestampedMetricVec::new(
                    ValueKind::Counter,
                    MetricOpts::new(NAMESPACE, SUBSYSTEM, metric.name(), metric.help()),
                    metric.label_names(),
                    staleness,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { families })
    }

    pub fn family(&self, metric: ZoneMetric) -> &TimestampedMetricVec {
        &self.families[metric.index()]
    }

    /// Accumulate `value` into one point of `metric`
    pub fn add(
        &self,
        metric: ZoneMetric,
        label_values: &[&str],
        value: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.family(metric).add(label_values, value, observed_at)
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<()> {
        for family in &self.families {
            registry.register(Box::new(family.clone()))?;
        }
        Ok(())
    }
}
