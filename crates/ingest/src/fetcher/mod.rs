//! Windowed pagination fetcher
//!
//! Drains one (zone, dataset) pair: query from a little before the
//! watermark, count only records past it, advance, and go again while the
//! API keeps returning full pages.
//!
//! When the grace window alone fills a page, the fetch drops the grace
//! period and re-queries from the watermark itself, otherwise the pair
//! would return the same page on every pass.

use std::time::Duration;

use cfx_connectors::{AnalyticsClient, Dataset, Zone};
use cfx_metrics::ZoneMetrics;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::extract::extract;
use crate::settings::{ScrapeSettings, before};
use crate::watermark::WatermarkTable;

/// What one fetch did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Queries issued
    pub pages: usize,
    /// Records newer than the watermark
    pub records: usize,
}

impl FetchSummary {
    pub fn merge(&mut self, other: FetchSummary) {
        self.pages += other.pages;
        self.records += other.records;
    }
}

/// Pull every new record of `dataset` for `zone` into `metrics`
///
/// The watermark only moves after a page has been fully extracted and
/// applied, so an error leaves it where the last good page put it.
pub async fn fetch_dataset<C: AnalyticsClient>(
    client: &C,
    metrics: &ZoneMetrics,
    watermarks: &mut WatermarkTable,
    settings: &ScrapeSettings,
    dataset: Dataset,
    zone: &Zone,
    now: DateTime<Utc>,
) -> Result<FetchSummary> {
    let mut summary = FetchSummary::default();
    let page_size = settings.max_page_size;
    let mut grace = settings.grace_period;

    loop {
        let last_seen = watermarks.get_or_init(&zone.id, dataset, before(now, settings.interval));
        let start = before(last_seen, grace);

        let mut zones = client
            .query_zone(dataset, &zone.id, start, page_size)
            .await?;
        if zones.len() != 1 {
            return Err(IngestError::UnexpectedZoneCount {
                zone: zone.name.clone(),
                count: zones.len(),
            });
        }
        let page = zones.swap_remove(0);

        let returned = page.record_count(dataset);
        let extraction = extract(dataset, &page, &zone.name, last_seen)?;
        extraction.apply(metrics)?;

        summary.pages += 1;
        summary.records += extraction.counted;

        let progressed = extraction
            .high_water
            .is_some_and(|high_water| watermarks.advance(&zone.id, dataset, high_water));
        watermarks.cap_if_stale(&zone.id, dataset, settings.max_window, now);

        debug!(
            zone = %zone.name,
            dataset = %dataset,
            returned,
            counted = extraction.counted,
            watermark = ?watermarks.get(&zone.id, dataset),
            "page processed"
        );

        if returned < page_size as usize {
            break;
        }
        if !progressed {
            if grace.is_zero() {
                warn!(
                    zone = %zone.name,
                    dataset = %dataset,
                    returned,
                    "full page brought no new records, stopping pagination"
                );
                break;
            }
            debug!(
                zone = %zone.name,
                dataset = %dataset,
                returned,
                "grace window fills a page, querying from the watermark"
            );
            grace = Duration::ZERO;
        }
    }

    Ok(summary)
}
