//! Configuration validation
//!
//! Checks value ranges that serde cannot express:
//! - Durations are non-zero
//! - The grace period is shorter than the max window
//! - The listen address parses as a socket address
//! - Endpoints are http(s) URLs

use std::net::SocketAddr;
use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_cloudflare(config)?;
    validate_scrape(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;

    if server.listen_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::invalid_value(
            "server",
            "listen_address",
            format!("'{}' is not a socket address", server.listen_address),
        ));
    }

    if !server.metrics_path.starts_with('/') {
        return Err(ConfigError::invalid_value(
            "server",
            "metrics_path",
            "must start with '/'",
        ));
    }

    if server.metrics_path == "/health" {
        return Err(ConfigError::invalid_value(
            "server",
            "metrics_path",
            "'/health' is reserved for the health check",
        ));
    }

    Ok(())
}

fn validate_cloudflare(config: &Config) -> Result<()> {
    let cf = &config.cloudflare;

    for (field, url) in [
        ("api_base_url", &cf.api_base_url),
        ("analytics_api_base_url", &cf.analytics_api_base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid_value(
                "cloudflare",
                field,
                format!("'{}' must be an http(s) URL", url),
            ));
        }
    }

    if cf.zones_per_page == 0 {
        return Err(ConfigError::invalid_value(
            "cloudflare",
            "zones_per_page",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_scrape(config: &Config) -> Result<()> {
    let scrape = &config.scrape;

    for (field, value) in [
        ("interval", scrape.interval),
        ("timeout", scrape.timeout),
        ("max_window", scrape.max_window),
        ("staleness", scrape.staleness),
    ] {
        if value == Duration::ZERO {
            return Err(ConfigError::invalid_value(
                "scrape",
                field,
                "must be greater than 0",
            ));
        }
    }

    if scrape.max_page_size == 0 {
        return Err(ConfigError::invalid_value(
            "scrape",
            "max_page_size",
            "must be greater than 0",
        ));
    }

    if scrape.grace_period >= scrape.max_window {
        return Err(ConfigError::invalid_value(
            "scrape",
            "grace_period",
            "must be shorter than max_window",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn invalid_field(toml: &str) -> &'static str {
        match Config::from_str(toml) {
            Err(ConfigError::InvalidValue { field, .. }) => field,
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_bad_listen_address() {
        assert_eq!(
            invalid_field("[server]\nlisten_address = \"localhost\""),
            "listen_address"
        );
    }

    #[test]
    fn test_bad_metrics_path() {
        assert_eq!(invalid_field("[server]\nmetrics_path = \"metrics\""), "metrics_path");
    }

    #[test]
    fn test_metrics_path_collides_with_health() {
        assert_eq!(invalid_field("[server]\nmetrics_path = \"/health\""), "metrics_path");
    }

    #[test]
    fn test_bad_api_url() {
        assert_eq!(
            invalid_field("[cloudflare]\napi_base_url = \"api.cloudflare.com\""),
            "api_base_url"
        );
    }

    #[test]
    fn test_zero_interval() {
        assert_eq!(invalid_field("[scrape]\ninterval = \"0s\""), "interval");
    }

    #[test]
    fn test_zero_zones_per_page() {
        assert_eq!(invalid_field("[cloudflare]\nzones_per_page = 0"), "zones_per_page");
    }

    #[test]
    fn test_grace_not_shorter_than_window() {
        assert_eq!(
            invalid_field("[scrape]\ngrace_period = \"1h\"\nmax_window = \"1h\""),
            "grace_period"
        );
    }

    #[test]
    fn test_zero_grace_is_allowed() {
        assert!(Config::from_str("[scrape]\ngrace_period = \"0s\"").is_ok());
    }
}
