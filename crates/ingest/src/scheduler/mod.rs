//! Scrape scheduler with rate-limit backoff
//!
//! Runs one ingestion pass per tick. Passes hold the pass lock for their
//! whole duration, and the exposition handler takes the same lock before
//! gathering, so a reader never sees half of a pass.
//!
//! A pass that fails on a rate limit makes the scheduler sit out the next
//! `n` ticks, where `n` is the number of consecutive rate-limited passes.
//! Any successful pass resets both counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use cfx_connectors::{AnalyticsClient, Dataset};
use cfx_metrics::MetricStore;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{IngestError, Result};
use crate::fetcher::{FetchSummary, fetch_dataset};
use crate::settings::ScrapeSettings;
use crate::watermark::WatermarkTable;


/// Where the scheduler is between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    /// Ticks still to be skipped
    Skipping(u32),
}

/// Mutable state carried across passes
#[derive(Debug, Default)]
pub struct ScrapeState {
    pub watermarks: WatermarkTable,
    /// Consecutive passes that ended in a rate-limit error
    pub rate_limit_failures: u32,
    /// Ticks left to skip
    pub skip_ticks: u32,
}

/// Lock-free view of the scheduler, readable while a pass holds the lock
#[derive(Debug, Default)]
struct Status {
    running: AtomicBool,
    skip_ticks: AtomicU32,
}

impl Status {
    fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            return SchedulerState::Running;
        }
        match self.skip_ticks.load(Ordering::Acquire) {
            0 => SchedulerState::Idle,
            n => SchedulerState::Skipping(n),
        }
    }
}

/// Lock serializing passes against metric reads
pub type PassLock = Arc<Mutex<ScrapeState>>;

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Backing off; `remaining` ticks still to skip after this one
    Skipped { remaining: u32 },
    /// Pass finished cleanly
    Completed(FetchSummary),
    /// Pass ended in an error
    Failed { rate_limited: bool },
}

/// Drives ingestion passes on a fixed interval
pub struct Scheduler<C> {
    client: C,
    store: MetricStore,
    settings: ScrapeSettings,
    state: PassLock,
    status: Status,
}

impl<C: AnalyticsClient> Scheduler<C> {
    pub fn new(client: C, store: MetricStore, settings: ScrapeSettings) -> Self {
        Self {
            client,
            store,
            settings,
            state: Arc::new(Mutex::new(ScrapeState::default())),
            status: Status::default(),
        }
    }

    /// Current state, without waiting for a pass to finish
    pub fn state(&self) -> SchedulerState {
        self.status.state()
    }

    /// Handle to the pass lock, for readers that must not see a partial pass
    pub fn pass_lock(&self) -> PassLock {
        Arc::clone(&self.state)
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Handle one timer tick: skip it while backing off, otherwise run a pass
    pub async fn tick(&self) -> TickOutcome {
        let mut state = self.state.lock().await;
        let exporter = self.store.exporter();

        if state.skip_ticks > 0 {
            state.skip_ticks -= 1;
            self.status.skip_ticks.store(state.skip_ticks, Ordering::Release);
            exporter.skipped_scrapes.inc();
            info!(
                remaining = state.skip_ticks,
                rate_limit_failures = state.rate_limit_failures,
                "skipping scrape while rate limited"
            );
            return TickOutcome::Skipped {
                remaining: state.skip_ticks,
            };
        }

        self.status.running.store(true, Ordering::Release);
        exporter.scrapes.inc();
        let started = Instant::now();

        let result = match tokio::time::timeout(
            self.settings.timeout,
            self.run_pass(&mut state.watermarks, Utc::now()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(IngestError::Timeout(self.settings.timeout)),
        };

        let elapsed = started.elapsed();
        exporter.last_scrape_duration.set(elapsed.as_secs_f64());

        let outcome = match result {
            Ok(summary) => {
                state.rate_limit_failures = 0;
                state.skip_ticks = 0;
                info!(
                    pages = summary.pages,
                    records = summary.records,
                    duration_ms = elapsed.as_millis() as u64,
                    "scrape complete"
                );
                TickOutcome::Completed(summary)
            }
            Err(e) if e.is_rate_limited() => {
                exporter.scrape_errors.inc();
                exporter.rate_limit_errors.inc();
                state.rate_limit_failures += 1;
                state.skip_ticks = state.rate_limit_failures;
                warn!(
                    error = %e,
                    rate_limit_failures = state.rate_limit_failures,
                    skip_ticks = state.skip_ticks,
                    "scrape rate limited, backing off"
                );
                TickOutcome::Failed { rate_limited: true }
            }
            Err(e) => {
                exporter.scrape_errors.inc();
                error!(error = %e, "scrape failed");
                TickOutcome::Failed {
                    rate_limited: false,
                }
            }
        };

        self.status.skip_ticks.store(state.skip_ticks, Ordering::Release);
        self.status.running.store(false, Ordering::Release);
        outcome
    }

    /// One ingestion pass: refresh zones, then drain every dataset for
    /// every zone
    ///
    /// A rate-limit error ends the pass at once. Other per-zone errors are
    /// logged and the pass carries on, returning the first of them at the
    /// end.
    async fn run_pass(
        &self,
        watermarks: &mut WatermarkTable,
        now: DateTime<Utc>,
    ) -> Result<FetchSummary> {
        let zones = self.client.list_zones().await?;
        self.store.exporter().zones_active.set(zones.len() as i64);
        debug!(zones = zones.len(), "starting scrape pass");

        let mut summary = FetchSummary::default();
        let mut first_error = None;

        for dataset in Dataset::ALL {
            for zone in &zones {
                match fetch_dataset(
                    &self.client,
                    self.store.zones(),
                    watermarks,
                    &self.settings,
                    dataset,
                    zone,
                    now,
                )
                .await
                {
                    Ok(fetched) => summary.merge(fetched),
                    Err(e) if e.is_rate_limited() => return Err(e),
                    Err(e) => {
                        warn!(
                            zone = %zone.name,
                            dataset = %dataset,
                            error = %e,
                            "zone scrape failed"
                        );
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Tick until `cancel` fires
    ///
    /// The first pass starts immediately. A pass already in flight runs to
    /// completion (or its own timeout) before cancellation is observed.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval = ?self.settings.interval,
            timeout = ?self.settings.timeout,
            max_page_size = self.settings.max_page_size,
            "starting scrape scheduler"
        );

        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("scrape scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}
