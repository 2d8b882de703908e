//! Analytics datasets and their GraphQL query templates
//!
//! Every template takes `$zone`, `$start_time` and `$limit`, filters on
//! `datetime_gt: $start_time` and orders ascending by `datetime`.

use std::fmt;

/// A named analytics query kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    /// `httpRequests1mGroups`: per-minute request aggregates
    HttpRequests,
    /// `firewallEventsAdaptiveGroups`: firewall events, excluding `log` actions
    FirewallEvents,
    /// `healthCheckEventsGroups`: health check outcomes
    HealthCheckEvents,
}

impl Dataset {
    /// Datasets in the order a pass visits them
    pub const ALL: [Dataset; 3] = [
        Self::HttpRequests,
        Self::FirewallEvents,
        Self::HealthCheckEvents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpRequests => "http_requests",
            Self::FirewallEvents => "firewall_events",
            Self::HealthCheckEvents => "health_check_events",
        }
    }

    /// GraphQL field holding this dataset's groups
    pub fn field(self) -> &'static str {
        match self {
            Self::HttpRequests => "httpRequests1mGroups",
            Self::FirewallEvents => "firewallEventsAdaptiveGroups",
            Self::HealthCheckEvents => "healthCheckEventsGroups",
        }
    }

    pub fn query(self) -> &'static str {
        match self {
            Self::HttpRequests => HTTP_REQUESTS_QUERY,
            Self::FirewallEvents => FIREWALL_EVENTS_QUERY,
            Self::HealthCheckEvents => HEALTH_CHECK_EVENTS_QUERY,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const HTTP_REQUESTS_QUERY: &str = r#"
query ($zone: String!, $start_time: Time!, $limit: Int!) {
  viewer {
    zones(filter: {zoneTag: $zone}) {
      zoneTag
      httpRequests1mGroups(limit: $limit, filter: {datetime_gt: $start_time}, orderBy: [datetime_ASC]) {
        sum {
          countryMap {
            clientCountryName
            requests
            threats
            bytes
          }
          cachedRequests
          cachedBytes
          clientHTTPVersionMap {
            clientHTTPProtocol
            requests
          }
          responseStatusMap {
            edgeResponseStatus
            requests
          }
          threatPathingMap {
            threatPathingName
            requests
          }
        }
        dimensions {
          datetime
        }
      }
    }
  }
}
"#;

const FIREWALL_EVENTS_QUERY: &str = r#"
query ($zone: String!, $start_time: Time!, $limit: Int!) {
  viewer {
    zones(filter: {zoneTag: $zone}) {
      zoneTag
      firewallEventsAdaptiveGroups(limit: $limit, filter: {datetime_gt: $start_time, action_neq: "log"}, orderBy: [datetime_ASC]) {
        count
        dimensions {
          action
          datetime
          ruleId
          source
        }
      }
    }
  }
}
"#;

const HEALTH_CHECK_EVENTS_QUERY: &str = r#"
query ($zone: String!, $start_time: Time!, $limit: Int!) {
  viewer {
    zones(filter: {zoneTag: $zone}) {
      zoneTag
      healthCheckEventsGroups(limit: $limit, filter: {datetime_gt: $start_time}, orderBy: [datetime_ASC]) {
        count
        dimensions {
          datetime
          failureReason
          healthCheckName
          healthStatus
          originResponseStatus
          region
          scope
        }
      }
    }
  }
}
"#;
