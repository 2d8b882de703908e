//! In-memory analytics source and record builders for tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use cfx_connectors::types::{
    CountryStats, DatetimeDimension, FirewallEventDimensions, FirewallEventGroup,
    HealthCheckEventDimensions, HealthCheckEventGroup, HttpRequestsGroup, HttpRequestsSum,
};
use cfx_connectors::{AnalyticsClient, ConnectorError, Dataset, Zone, ZoneAnalytics};
use chrono::{DateTime, Utc};

pub(crate) fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
}

pub(crate) fn http_group(datetime: &str, country: &str, requests: u64) -> HttpRequestsGroup {
    HttpRequestsGroup {
        dimensions: DatetimeDimension {
            datetime: datetime.to_string(),
        },
        sum: HttpRequestsSum {
            country_map: vec![CountryStats {
                client_country_name: country.to_string(),
                requests,
                threats: 0,
                bytes: requests * 100,
            }],
            ..Default::default()
        },
    }
}

pub(crate) fn firewall_group(datetime: &str, action: &str, count: u64) -> FirewallEventGroup {
    FirewallEventGroup {
        count,
        dimensions: FirewallEventDimensions {
            action: action.to_string(),
            datetime: datetime.to_string(),
            rule_id: "rule-1".to_string(),
            source: "waf".to_string(),
        },
    }
}

pub(crate) fn health_check_group(datetime: &str, count: u64) -> HealthCheckEventGroup {
    HealthCheckEventGroup {
        count,
        dimensions: HealthCheckEventDimensions {
            datetime: datetime.to_string(),
            failure_reason: "TCP connection failed".to_string(),
            health_check_name: "origin".to_string(),
            health_status: "unhealthy".to_string(),
            origin_response_status: 0,
            region: "WEU".to_string(),
            scope: "pool".to_string(),
        },
    }
}

/// A query the fake received
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Query {
    pub dataset: Dataset,
    pub zone_id: String,
    pub start: DateTime<Utc>,
}

/// Serves stored records the way the analytics API would: `datetime > start`,
/// ascending, truncated to the limit
#[derive(Default)]
pub(crate) struct FakeAnalytics {
    zones: Vec<Zone>,
    records: Mutex<HashMap<String, ZoneAnalytics>>,
    zone_errors: Mutex<VecDeque<ConnectorError>>,
    failing_zones: Mutex<HashMap<String, fn() -> ConnectorError>>,
    duplicate_zones: HashSet<String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<Query>>,
}

impl FakeAnalytics {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones,
            ..Default::default()
        }
    }

    /// Sleep this long in every zone lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer queries for this zone with two zone entries
    pub fn with_duplicate_zone(mut self, zone_id: &str) -> Self {
        self.duplicate_zones.insert(zone_id.to_string());
        self
    }

    pub fn add_http(&self, zone_id: &str, group: HttpRequestsGroup) {
        self.entry(zone_id, |z| z.http_requests.push(group));
    }

    pub fn add_firewall(&self, zone_id: &str, group: FirewallEventGroup) {
        self.entry(zone_id, |z| z.firewall_events.push(group));
    }

    pub fn add_health_check(&self, zone_id: &str, group: HealthCheckEventGroup) {
        self.entry(zone_id, |z| z.health_check_events.push(group));
    }

    /// Fail the next zone lookup with `error`
    pub fn fail_next_lookup(&self, error: ConnectorError) {
        self.zone_errors.lock().unwrap().push_back(error);
    }

    /// Fail every query for `zone_id`
    pub fn fail_zone(&self, zone_id: &str, error: fn() -> ConnectorError) {
        self.failing_zones
            .lock()
            .unwrap()
            .insert(zone_id.to_string(), error);
    }

    pub fn heal_zone(&self, zone_id: &str) {
        self.failing_zones.lock().unwrap().remove(zone_id);
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    fn entry(&self, zone_id: &str, f: impl FnOnce(&mut ZoneAnalytics)) {
        let mut records = self.records.lock().unwrap();
        let zone = records
            .entry(zone_id.to_string())
            .or_insert_with(|| ZoneAnalytics {
                zone_tag: zone_id.to_string(),
                ..Default::default()
            });
        f(zone);
    }
}

/// Keep records after `start`, in order, at most `limit`
///
/// Unparsable datetimes are always kept so extraction sees them.
fn window<T: Clone>(
    records: &[T],
    datetime: impl Fn(&T) -> &str,
    start: DateTime<Utc>,
    limit: u32,
) -> Vec<T> {
    let mut kept: Vec<T> = records
        .iter()
        .filter(|r| match DateTime::parse_from_rfc3339(datetime(*r)) {
            Ok(t) => t.with_timezone(&Utc) > start,
            Err(_) => true,
        })
        .cloned()
        .collect();
    kept.sort_by_key(|r| datetime(r).to_string());
    kept.truncate(limit as usize);
    kept
}

impl AnalyticsClient for FakeAnalytics {
    async fn list_zones(&self) -> Result<Vec<Zone>, ConnectorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next_error = self.zone_errors.lock().unwrap().pop_front();
        match next_error {
            Some(error) => Err(error),
            None => Ok(self.zones.clone()),
        }
    }

    async fn query_zone(
        &self,
        dataset: Dataset,
        zone_id: &str,
        start: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ZoneAnalytics>, ConnectorError> {
        self.queries.lock().unwrap().push(Query {
            dataset,
            zone_id: zone_id.to_string(),
            start,
        });

        let failure = self.failing_zones.lock().unwrap().get(zone_id).copied();
        if let Some(error) = failure {
            return Err(error());
        }

        let stored = self
            .records
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default();

        let mut page = ZoneAnalytics {
            zone_tag: zone_id.to_string(),
            ..Default::default()
        };
        match dataset {
            Dataset::HttpRequests => {
                page.http_requests =
                    window(&stored.http_requests, |r| r.dimensions.datetime.as_str(), start, limit)
            }
            Dataset::FirewallEvents => {
                page.firewall_events = window(
                    &stored.firewall_events,
                    |r| r.dimensions.datetime.as_str(),
                    start,
                    limit,
                )
            }
            Dataset::HealthCheckEvents => {
                page.health_check_events = window(
                    &stored.health_check_events,
                    |r| r.dimensions.datetime.as_str(),
                    start,
                    limit,
                )
            }
        }

        if self.duplicate_zones.contains(zone_id) {
            return Ok(vec![page.clone(), page]);
        }
        Ok(vec![page])
    }
}
