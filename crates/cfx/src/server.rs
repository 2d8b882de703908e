//! Metrics exposition server
//!
//! `GET {metrics_path}` renders the store in the Prometheus text format
//! after taking the pass lock, so a scrape never lands in the middle of
//! an ingestion pass. `GET /health` always answers 200.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use cfx_ingest::PassLock;
use cfx_metrics::MetricStore;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: MetricStore,
    pub pass_lock: PassLock,
}

/// Build the exposition router
pub fn router(state: AppState, metrics_path: &str) -> Router {
    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
///
/// GET /health
async fn health_handler() -> &'static str {
    "ok"
}

/// Prometheus exposition
///
/// GET /metrics (or the configured path)
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let _pass = state.pass_lock.lock().await;

    match state.store.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, state.store.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}
