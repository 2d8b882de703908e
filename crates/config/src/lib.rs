//! cfx Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the Cloudflare credentials have to be supplied; they may also come
//! from the command line or the environment, so they are checked separately
//! from the rest of the file.
//!
//! # Parsing
//!
//! ```
//! use cfx_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[scrape]\ninterval = \"2m\"").unwrap();
//! assert_eq!(config.scrape.interval.as_secs(), 120);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [server]
//! listen_address = "0.0.0.0:11313"
//!
//! [cloudflare]
//! api_email = "ops@example.com"
//! api_key = "0123456789abcdef"
//!
//! [scrape]
//! interval = "60s"
//! timeout = "30s"
//! max_page_size = 10000
//! grace_period = "5m"
//! max_window = "1h"
//! staleness = "15m"
//! ```

mod cloudflare;
mod error;
mod logging;
mod scrape;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use cloudflare::{CloudflareConfig, Credentials};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use scrape::ScrapeConfig;
pub use server::{ServerConfig, normalize_listen_address};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Exposition endpoint
    pub server: ServerConfig,

    /// Cloudflare endpoints and credentials
    pub cloudflare: CloudflareConfig,

    /// Polling cadence and window bounds
    pub scrape: ScrapeConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Call again after applying command line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.server.listen_address, "0.0.0.0:11313");
        assert_eq!(config.scrape.max_page_size, 10_000);
        assert!(config.cloudflare.api_email.is_none());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[server]
listen_address = "127.0.0.1:9000"
metrics_path = "/prom"

[cloudflare]
api_email = "ops@example.com"
api_key = "secret"
api_base_url = "http://localhost:8080/client/v4"
analytics_api_base_url = "http://localhost:8080/client/v4/graphql"
zones_per_page = 20

[scrape]
interval = "2m"
timeout = "45s"
max_page_size = 500
grace_period = "2m"
max_window = "30m"
staleness = "10m"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.server.listen_address, "127.0.0.1:9000");
        assert_eq!(config.server.metrics_path, "/prom");
        assert_eq!(config.cloudflare.api_email.as_deref(), Some("ops@example.com"));
        assert_eq!(config.cloudflare.zones_per_page, 20);
        assert_eq!(config.scrape.interval, Duration::from_secs(120));
        assert_eq!(config.scrape.timeout, Duration::from_secs(45));
        assert_eq!(config.scrape.max_page_size, 500);
        assert_eq!(config.scrape.grace_period, Duration::from_secs(120));
        assert_eq!(config.scrape.max_window, Duration::from_secs(1800));
        assert_eq!(config.scrape.staleness, Duration::from_secs(600));
    }

    #[test]
    fn test_bare_port_listen_address_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten_address = \":11313\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.listen_address, "0.0.0.0:11313");
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[scrape]\nmax_page_size = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cloudflare]\napi_email = \"a@b.c\"\napi_key = \"k\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let credentials = config.cloudflare.credentials().unwrap();
        assert_eq!(credentials.email, "a@b.c");
        assert_eq!(credentials.api_key, "k");
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/cfx.toml");
        match result {
            Err(ConfigError::IoError { path, .. }) => assert!(path.contains("cfx.toml")),
            other => panic!("expected IoError, got {:?}", other),
        }
    }
}
