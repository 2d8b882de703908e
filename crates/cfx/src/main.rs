//! Cloudflare Exporter - Prometheus exporter for Cloudflare zone analytics
//!
//! # Usage
//!
//! ```bash
//! cloudflare-exporter --config exporter.toml
//!
//! # Everything the original flags covered can also come from the environment
//! CLOUDFLARE_API_EMAIL=ops@example.com CLOUDFLARE_API_KEY=... cloudflare-exporter
//! ```

mod serve;
mod server;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use cfx_config::{Config, LogFormat, normalize_listen_address};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Prometheus exporter for Cloudflare zone analytics
#[derive(Parser, Debug)]
#[command(name = "cloudflare-exporter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(long)]
    log_level: Option<String>,

    /// Metrics listen address, e.g. "0.0.0.0:11313" or ":11313"
    #[arg(short, long, env = "CLOUDFLARE_EXPORTER_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// Email address for API authentication
    #[arg(long, env = "CLOUDFLARE_API_EMAIL")]
    cloudflare_api_email: Option<String>,

    /// API key for API authentication
    #[arg(long, env = "CLOUDFLARE_API_KEY", hide_env_values = true)]
    cloudflare_api_key: Option<String>,

    /// Cloudflare regular (non-analytics) API base URL
    #[arg(long, env = "CLOUDFLARE_API_BASE_URL")]
    cloudflare_api_base_url: Option<String>,

    /// Cloudflare analytics (GraphQL) API base URL
    #[arg(long, env = "CLOUDFLARE_ANALYTICS_API_BASE_URL")]
    cloudflare_analytics_api_base_url: Option<String>,

    /// Seconds between analytics scrapes
    #[arg(long, env = "CLOUDFLARE_SCRAPE_INTERVAL_SECONDS")]
    cloudflare_scrape_interval_seconds: Option<u64>,

    /// Deadline for a single scrape, in seconds
    #[arg(long, env = "CLOUDFLARE_EXPORTER_SCRAPE_TIMEOUT_SECONDS")]
    scrape_timeout_seconds: Option<u64>,
}

impl Cli {
    /// Overlay flags and environment onto the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(addr) = &self.listen_address {
            config.server.listen_address = normalize_listen_address(addr);
        }
        if let Some(email) = &self.cloudflare_api_email {
            config.cloudflare.api_email = Some(email.clone());
        }
        if let Some(key) = &self.cloudflare_api_key {
            config.cloudflare.api_key = Some(key.clone());
        }
        if let Some(url) = &self.cloudflare_api_base_url {
            config.cloudflare.api_base_url = url.clone();
        }
        if let Some(url) = &self.cloudflare_analytics_api_base_url {
            config.cloudflare.analytics_api_base_url = url.clone();
        }
        if let Some(secs) = self.cloudflare_scrape_interval_seconds {
            config.scrape.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.scrape_timeout_seconds {
            config.scrape.timeout = Duration::from_secs(secs);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    config
        .validate()
        .context("invalid configuration after applying flags")?;

    let log_level = resolve_log_level(cli.log_level.as_deref(), &config);
    init_logging(&log_level, config.log.format)?;

    serve::run(config).await
}

/// Load the file if one was given, defaults otherwise
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("config file not found: {}", path.display()));
            }
            Config::from_file(path).context("failed to load configuration")
        }
        None => Ok(Config::default()),
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, config: &Config) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => config.log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_current_span(false))
            .with(filter)
            .init(),
    }

    Ok(())
}
