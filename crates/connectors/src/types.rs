//! Cloudflare response models
//!
//! Analytics records keep their `datetime` as the raw string the API
//! returned. Parsing happens during extraction so a bad timestamp is
//! reported against the page it arrived in.

use serde::Deserialize;

use crate::dataset::Dataset;

/// An active zone: opaque tag plus display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One zone entry of an analytics response
///
/// Only the field belonging to the queried dataset is populated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoneAnalytics {
    pub zone_tag: String,
    #[serde(rename = "httpRequests1mGroups")]
    pub http_requests: Vec<HttpRequestsGroup>,
    #[serde(rename = "firewallEventsAdaptiveGroups")]
    pub firewall_events: Vec<FirewallEventGroup>,
    #[serde(rename = "healthCheckEventsGroups")]
    pub health_check_events: Vec<HealthCheckEventGroup>,
}

impl ZoneAnalytics {
    /// Records returned for `dataset`
    pub fn record_count(&self, dataset: Dataset) -> usize {
        match dataset {
            Dataset::HttpRequests => self.http_requests.len(),
            Dataset::FirewallEvents => self.firewall_events.len(),
            Dataset::HealthCheckEvents => self.health_check_events.len(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatetimeDimension {
    pub datetime: String,
}

/// One minute of HTTP request aggregates
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpRequestsGroup {
    pub dimensions: DatetimeDimension,
    pub sum: HttpRequestsSum,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpRequestsSum {
    pub country_map: Vec<CountryStats>,
    pub cached_requests: u64,
    pub cached_bytes: u64,
    #[serde(rename = "clientHTTPVersionMap")]
    pub client_http_version_map: Vec<ProtocolStats>,
    pub response_status_map: Vec<ResponseStatusStats>,
    pub threat_pathing_map: Vec<ThreatPathingStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CountryStats {
    pub client_country_name: String,
    pub requests: u64,
    pub threats: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProtocolStats {
    #[serde(rename = "clientHTTPProtocol")]
    pub client_http_protocol: String,
    pub requests: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseStatusStats {
    pub edge_response_status: u16,
    pub requests: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreatPathingStats {
    pub threat_pathing_name: String,
    pub requests: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FirewallEventGroup {
    pub count: u64,
    pub dimensions: FirewallEventDimensions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirewallEventDimensions {
    pub action: String,
    pub datetime: String,
    pub rule_id: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthCheckEventGroup {
    pub count: u64,
    pub dimensions: HealthCheckEventDimensions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCheckEventDimensions {
    pub datetime: String,
    pub failure_reason: String,
    pub health_check_name: String,
    pub health_status: String,
    pub origin_response_status: u16,
    pub region: String,
    pub scope: String,
}

// Wire envelopes, private to the client

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerData {
    pub viewer: ViewerZones,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerZones {
    #[serde(default)]
    pub zones: Vec<ZoneAnalytics>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZoneListResponse {
    #[serde(default)]
    pub result: Vec<ZoneRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZoneRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}
