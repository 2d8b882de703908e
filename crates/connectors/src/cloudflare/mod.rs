//! Cloudflare API client
//!
//! Zone lookup goes through the REST API, analytics through the GraphQL
//! endpoint. Both authenticate with the `X-AUTH-EMAIL` / `X-AUTH-KEY`
//! header pair.

use std::time::Duration;

use cfx_config::{CloudflareConfig, Credentials};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::error::ConnectorError;
use crate::traits::AnalyticsClient;
use crate::types::{
    GraphQlError, GraphQlResponse, ViewerData, Zone, ZoneAnalytics, ZoneListResponse,
};


const USER_AGENT: &str = concat!("cloudflare-exporter/", env!("CARGO_PKG_VERSION"));

/// GraphQL error messages that mean the request budget is exhausted
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "limit exceeded", "budget"];

/// Cloudflare client for zone lookup and analytics queries
#[derive(Debug, Clone)]
pub struct Cloudflare {
    client: reqwest::Client,
    credentials: Credentials,
    api_base_url: String,
    analytics_url: String,
    zones_per_page: u32,
}

impl Cloudflare {
    /// Create a client from the `[cloudflare]` section
    ///
    /// `timeout` bounds every single request.
    ///
    /// # Errors
    ///
    /// Returns `Init` if credentials are missing or the HTTP client cannot
    /// be built (e.g., TLS misconfiguration)
    pub fn from_config(
        config: &CloudflareConfig,
        timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let credentials = config
            .credentials()
            .map_err(|e| ConnectorError::Init(e.to_string()))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Init(format!("Cloudflare HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            analytics_url: config.analytics_api_base_url.clone(),
            zones_per_page: config.zones_per_page,
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-AUTH-EMAIL", &self.credentials.email)
            .header("X-AUTH-KEY", &self.credentials.api_key)
    }

    /// Map a non-success response to an error
    async fn handle_error_status(response: reqwest::Response) -> ConnectorError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                ConnectorError::AuthFailed(format!("{}: {}", status, body))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => ConnectorError::RateLimited {
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            },
            _ => ConnectorError::Status {
                status: status.as_u16(),
                body,
            },
        }
    }
}

/// Fold a GraphQL `errors` array into one typed error
fn classify_graphql_errors(errors: &[GraphQlError]) -> ConnectorError {
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    let lowered = message.to_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
        ConnectorError::RateLimited { message }
    } else {
        ConnectorError::GraphQl(message)
    }
}

impl AnalyticsClient for Cloudflare {
    async fn list_zones(&self) -> Result<Vec<Zone>, ConnectorError> {
        let url = format!("{}/zones", self.api_base_url);
        let response = self
            .authed(self.client.get(&url))
            .query(&[("per_page", self.zones_per_page)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_status(response).await);
        }

        let body = response.text().await?;
        let listing: ZoneListResponse = serde_json::from_str(&body)?;

        let zones: Vec<Zone> = listing
            .result
            .into_iter()
            .filter(|z| z.status != "pending")
            .map(|z| Zone::new(z.id, z.name))
            .collect();

        if zones.len() as u32 >= self.zones_per_page {
            warn!(
                zones = zones.len(),
                per_page = self.zones_per_page,
                "zone list filled a whole page, further zones are ignored"
            );
        }
        debug!(zones = zones.len(), "listed zones");

        Ok(zones)
    }

    async fn query_zone(
        &self,
        dataset: Dataset,
        zone_id: &str,
        start: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ZoneAnalytics>, ConnectorError> {
        let payload = json!({
            "query": dataset.query(),
            "variables": {
                "zone": zone_id,
                "start_time": start.to_rfc3339_opts(SecondsFormat::Secs, true),
                "limit": limit,
            },
        });

        let response = self
            .authed(self.client.post(&self.analytics_url))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_status(response).await);
        }

        let body = response.text().await?;
        let parsed: GraphQlResponse<ViewerData> = serde_json::from_str(&body)?;

        if !parsed.errors.is_empty() {
            return Err(classify_graphql_errors(&parsed.errors));
        }

        let data = parsed
            .data
            .ok_or_else(|| ConnectorError::GraphQl("response carried no data".into()))?;

        debug!(
            dataset = %dataset,
            zone_id = %zone_id,
            zones = data.viewer.zones.len(),
            "analytics page received"
        );

        Ok(data.viewer.zones)
    }
}
