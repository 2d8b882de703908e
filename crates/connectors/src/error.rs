//! Error types for the Cloudflare client

use thiserror::Error;

/// Errors that can occur talking to the Cloudflare APIs
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Failed to initialize the client (e.g., HTTP client creation failed)
    #[error("failed to initialize client: {0}")]
    Init(String),

    /// Transport failure, including request timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status that is neither auth nor rate limiting
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The GraphQL endpoint answered with an `errors` array
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Request budget exhausted
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}

impl ConnectorError {
    /// True when the request was rejected by a rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        let limited = ConnectorError::RateLimited {
            message: "budget depleted".into(),
        };
        assert!(limited.is_rate_limited());

        let other = ConnectorError::GraphQl("unknown field".into());
        assert!(!other.is_rate_limited());
        assert!(!ConnectorError::AuthFailed("bad key".into()).is_rate_limited());
    }

    #[test]
    fn test_display() {
        let err = ConnectorError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "unexpected status 502: bad gateway");
    }
}
