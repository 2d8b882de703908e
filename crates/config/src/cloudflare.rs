//! Cloudflare API configuration
//!
//! Endpoints and credentials for the zone list (REST) and analytics (GraphQL) APIs.

use std::fmt;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Cloudflare API configuration
///
/// # Example
///
/// ```toml
/// [cloudflare]
/// api_email = "ops@example.com"
/// api_key = "0123456789abcdef"
/// api_base_url = "https://api.cloudflare.com/client/v4"                      # default
/// analytics_api_base_url = "https://api.cloudflare.com/client/v4/graphql"    # default
/// zones_per_page = 50                                                        # default
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CloudflareConfig {
    /// Account email sent as `X-AUTH-EMAIL`
    pub api_email: Option<String>,

    /// Global API key sent as `X-AUTH-KEY`
    pub api_key: Option<String>,

    /// Regular (non-analytics) API base URL
    pub api_base_url: String,

    /// Analytics (GraphQL) endpoint
    pub analytics_api_base_url: String,

    /// Zones requested from the single zone list page
    /// Default: 50 (the API maximum)
    pub zones_per_page: u32,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_email: None,
            api_key: None,
            api_base_url: "https://api.cloudflare.com/client/v4".to_string(),
            analytics_api_base_url: "https://api.cloudflare.com/client/v4/graphql".to_string(),
            zones_per_page: 50,
        }
    }
}

impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_email", &self.api_email)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("analytics_api_base_url", &self.analytics_api_base_url)
            .field("zones_per_page", &self.zones_per_page)
            .finish()
    }
}

impl CloudflareConfig {
    /// Resolve the credentials pair
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when either value is absent or empty.
    pub fn credentials(&self) -> Result<Credentials> {
        let email = non_empty(self.api_email.as_deref())
            .ok_or_else(|| ConfigError::missing_field("cloudflare", "api_email"))?;
        let api_key = non_empty(self.api_key.as_deref())
            .ok_or_else(|| ConfigError::missing_field("cloudflare", "api_key"))?;

        Ok(Credentials {
            email: email.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Email + API key pair used on every Cloudflare request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
