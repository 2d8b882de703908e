//! Cloudflare Exporter - Ingest
//!
//! The incremental ingestion engine: turns paginated, time-windowed
//! analytics queries into timestamped counters without double counting.
//!
//! # Flow
//!
//! ```text
//! Scheduler tick
//!     │
//!     ├──► skip while backing off from a rate limit
//!     │
//!     └──► pass (holding the pass lock)
//!             list zones
//!             for each dataset, for each zone:
//!                 watermark ──► query from watermark - grace
//!                           ──► extract records newer than watermark
//!                           ──► add deltas to the metric store
//!                           ──► advance watermark, cap if stale
//!                           ──► repeat while pages come back full
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cfx_ingest::{Scheduler, ScrapeSettings};
//!
//! let scheduler = Scheduler::new(cloudflare, store.clone(), ScrapeSettings::from(&config.scrape));
//! let pass_lock = scheduler.pass_lock();
//! tokio::spawn(scheduler.run(cancel.clone()));
//! ```

mod error;
pub mod extract;
mod fetcher;
mod scheduler;
mod settings;
mod watermark;

#[cfg(test)]
mod testing;

pub use error::{IngestError, Result};
pub use extract::{Delta, Extraction, extract};
pub use fetcher::{FetchSummary, fetch_dataset};
pub use scheduler::{PassLock, Scheduler, SchedulerState, ScrapeState, TickOutcome};
pub use settings::ScrapeSettings;
pub use watermark::WatermarkTable;
