//! Exposition server configuration

use serde::{Deserialize, Deserializer};

/// Metrics exposition endpoint
///
/// # Example
///
/// ```toml
/// [server]
/// listen_address = "0.0.0.0:11313"   # default
/// metrics_path = "/metrics"          # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to. A bare ":port" binds on all
    /// interfaces.
    /// Default: "0.0.0.0:11313"
    #[serde(deserialize_with = "deserialize_listen_address")]
    pub listen_address: String,

    /// Path serving the Prometheus text exposition
    /// Default: "/metrics"
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:11313".to_string(),
            metrics_path: "/metrics".to_string(),
        }
    }
}

/// Expand the bare ":port" form to "0.0.0.0:port"
pub fn normalize_listen_address(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => addr.to_string(),
    }
}

fn deserialize_listen_address<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|addr| normalize_listen_address(&addr))
}
