//! Run the exporter
//!
//! Wires the metric store, Cloudflare client, scrape scheduler and HTTP
//! server together, then waits for SIGINT/SIGTERM.

use std::time::Duration;

use anyhow::{Context, Result};
use cfx_config::Config;
use cfx_connectors::Cloudflare;
use cfx_ingest::{Scheduler, ScrapeSettings};
use cfx_metrics::MetricStore;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::server::{AppState, router};

/// Time allowed for an in-flight pass to finish after shutdown is requested
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run until a shutdown signal arrives
pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "cloudflare exporter starting"
    );

    let cancel = CancellationToken::new();

    let store = MetricStore::new(config.scrape.staleness).context("failed to build metric store")?;
    let cloudflare = Cloudflare::from_config(&config.cloudflare, config.scrape.timeout)
        .context("failed to create Cloudflare client")?;

    let scheduler = Scheduler::new(cloudflare, store.clone(), ScrapeSettings::from(&config.scrape));
    let state = AppState {
        store,
        pass_lock: scheduler.pass_lock(),
    };

    let listener = TcpListener::bind(&config.server.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_address))?;
    info!(
        addr = %config.server.listen_address,
        path = %config.server.metrics_path,
        "metrics server listening"
    );

    let app = router(state, &config.server.metrics_path);
    let server_cancel = cancel.clone();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_cancel.cancelled().await;
            })
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "metrics server error");
            });
    });

    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    wait_for_shutdown().await;
    info!("shutdown signal received, stopping exporter...");
    cancel.cancel();

    for (name, task) in [("scheduler", scheduler_task), ("server", server_task)] {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(task = name, error = %e, "task panicked during shutdown"),
            Err(_) => warn!(task = name, "task did not finish within timeout"),
        }
    }

    info!("cloudflare exporter shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
