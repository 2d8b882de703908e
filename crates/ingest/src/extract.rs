//! Extraction of metric deltas from analytics pages
//!
//! Each dataset's record type declares how it maps onto zone metric
//! families; one generic routine applies the watermark filter and tracks
//! the page's high-water mark. Nothing touches the store until the whole
//! page has parsed.

use cfx_connectors::Dataset;
use cfx_connectors::types::{
    FirewallEventGroup, HealthCheckEventGroup, HttpRequestsGroup, ZoneAnalytics,
};
use cfx_metrics::{ZoneMetric, ZoneMetrics};
use chrono::{DateTime, Utc};

use crate::error::{IngestError, Result};

/// One addition into a zone metric family
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub metric: ZoneMetric,
    /// Label values, in the family's label order
    pub labels: Vec<String>,
    pub value: u64,
    pub observed_at: DateTime<Utc>,
}

/// Deltas of one page plus the newest counted observation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub deltas: Vec<Delta>,
    /// `None` when no record was newer than the watermark
    pub high_water: Option<DateTime<Utc>>,
    /// Records newer than the watermark
    pub counted: usize,
}

impl Extraction {
    /// Add every delta into the store
    pub fn apply(&self, zones: &ZoneMetrics) -> Result<()> {
        for delta in &self.deltas {
            let labels: Vec<&str> = delta.labels.iter().map(String::as_str).collect();
            zones.add(delta.metric, &labels, delta.value as f64, delta.observed_at)?;
        }
        Ok(())
    }
}

/// A timestamped analytics record that knows its metric breakdown
trait Record {
    fn datetime(&self) -> &str;

    fn emit(&self, zone: &str, observed_at: DateTime<Utc>, out: &mut Vec<Delta>);
}

fn delta(
    metric: ZoneMetric,
    labels: &[&str],
    value: u64,
    observed_at: DateTime<Utc>,
) -> Delta {
    Delta {
        metric,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        value,
        observed_at,
    }
}

impl Record for HttpRequestsGroup {
    fn datetime(&self) -> &str {
        &self.dimensions.datetime
    }

    fn emit(&self, zone: &str, at: DateTime<Utc>, out: &mut Vec<Delta>) {
        let sum = &self.sum;

        for country in &sum.country_map {
            let labels = [zone, country.client_country_name.as_str()];
            out.push(delta(ZoneMetric::HttpCountryRequests, &labels, country.requests, at));
            out.push(delta(ZoneMetric::HttpCountryThreats, &labels, country.threats, at));
            out.push(delta(ZoneMetric::HttpCountryBytes, &labels, country.bytes, at));
        }

        out.push(delta(ZoneMetric::HttpCachedRequests, &[zone], sum.cached_requests, at));
        out.push(delta(ZoneMetric::HttpCachedBytes, &[zone], sum.cached_bytes, at));

        for protocol in &sum.client_http_version_map {
            out.push(delta(
                ZoneMetric::HttpProtocolRequests,
                &[zone, protocol.client_http_protocol.as_str()],
                protocol.requests,
                at,
            ));
        }

        for status in &sum.response_status_map {
            let code = status.edge_response_status.to_string();
            out.push(delta(
                ZoneMetric::HttpResponses,
                &[zone, code.as_str()],
                status.requests,
                at,
            ));
        }

        for threat in &sum.threat_pathing_map {
            out.push(delta(
                ZoneMetric::HttpThreats,
                &[zone, threat.threat_pathing_name.as_str()],
                threat.requests,
                at,
            ));
        }
    }
}

impl Record for FirewallEventGroup {
    fn datetime(&self) -> &str {
        &self.dimensions.datetime
    }

    fn emit(&self, zone: &str, at: DateTime<Utc>, out: &mut Vec<Delta>) {
        let dims = &self.dimensions;
        out.push(delta(
            ZoneMetric::FirewallEvents,
            &[zone, &dims.action, &dims.source, &dims.rule_id],
            self.count,
            at,
        ));
    }
}

impl Record for HealthCheckEventGroup {
    fn datetime(&self) -> &str {
        &self.dimensions.datetime
    }

    fn emit(&self, zone: &str, at: DateTime<Utc>, out: &mut Vec<Delta>) {
        let dims = &self.dimensions;
        let origin_status = dims.origin_response_status.to_string();
        out.push(delta(
            ZoneMetric::HealthCheckEvents,
            &[
                zone,
                &dims.failure_reason,
                &dims.health_check_name,
                &dims.health_status,
                &origin_status,
                &dims.region,
                &dims.scope,
            ],
            self.count,
            at,
        ));
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| IngestError::MalformedTimestamp {
            value: value.to_string(),
            source,
        })
}

fn extract_records<R: Record>(
    records: &[R],
    zone: &str,
    watermark: DateTime<Utc>,
) -> Result<Extraction> {
    let mut extraction = Extraction::default();

    for record in records {
        let observed_at = parse_datetime(record.datetime())?;
        if observed_at <= watermark {
            continue;
        }

        record.emit(zone, observed_at, &mut extraction.deltas);
        extraction.counted += 1;
        extraction.high_water = extraction.high_water.max(Some(observed_at));
    }

    Ok(extraction)
}

/// Turn one page of `dataset` into deltas
///
/// Only records strictly newer than `watermark` contribute. `zone` is the
/// display name used as the `zone` label. Any unparsable timestamp fails
/// the whole page.
pub fn extract(
    dataset: Dataset,
    page: &ZoneAnalytics,
    zone: &str,
    watermark: DateTime<Utc>,
) -> Result<Extraction> {
    match dataset {
        Dataset::HttpRequests => extract_records(&page.http_requests, zone, watermark),
        Dataset::FirewallEvents => extract_records(&page.firewall_events, zone, watermark),
        Dataset::HealthCheckEvents => {
            extract_records(&page.health_check_events, zone, watermark)
        }
    }
}
