//! Watermark table
//!
//! Last counted observation time per (zone, dataset). This is the only
//! thing standing between overlapping query windows and double counting.

use std::collections::HashMap;
use std::time::Duration;

use cfx_connectors::Dataset;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::settings::before;

/// Per (zone id, dataset) watermarks
#[derive(Debug, Default, Clone)]
pub struct WatermarkTable {
    marks: HashMap<(String, Dataset), DateTime<Utc>>,
}

impl WatermarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last counted time, `None` if the pair was never seen
    pub fn get(&self, zone_id: &str, dataset: Dataset) -> Option<DateTime<Utc>> {
        self.marks.get(&(zone_id.to_string(), dataset)).copied()
    }

    /// Last counted time, initializing an unseen pair to `initial`
    pub fn get_or_init(
        &mut self,
        zone_id: &str,
        dataset: Dataset,
        initial: DateTime<Utc>,
    ) -> DateTime<Utc> {
        *self
            .marks
            .entry((zone_id.to_string(), dataset))
            .or_insert_with(|| {
                debug!(
                    zone_id = %zone_id,
                    dataset = %dataset,
                    watermark = %initial,
                    "initialized watermark"
                );
                initial
            })
    }

    /// Move the watermark forward to `to`
    ///
    /// Returns `true` if it moved. A value older than the current watermark
    /// is refused and logged; equal values are a no-op.
    pub fn advance(&mut self, zone_id: &str, dataset: Dataset, to: DateTime<Utc>) -> bool {
        match self.marks.get_mut(&(zone_id.to_string(), dataset)) {
            Some(current) if to < *current => {
                warn!(
                    zone_id = %zone_id,
                    dataset = %dataset,
                    current = %current,
                    attempted = %to,
                    "refusing to move watermark backwards"
                );
                false
            }
            Some(current) if to == *current => false,
            Some(current) => {
                *current = to;
                true
            }
            None => {
                self.marks.insert((zone_id.to_string(), dataset), to);
                true
            }
        }
    }

    /// Force a watermark older than `now - max_window` up to that bound
    ///
    /// Keeps the next query window inside the range the analytics API
    /// accepts when a dataset has been quiet for a long time. Returns `true`
    /// if the watermark was capped.
    pub fn cap_if_stale(
        &mut self,
        zone_id: &str,
        dataset: Dataset,
        max_window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let floor = before(now, max_window);
        match self.marks.get_mut(&(zone_id.to_string(), dataset)) {
            Some(current) if *current < floor => {
                debug!(
                    zone_id = %zone_id,
                    dataset = %dataset,
                    from = %current,
                    to = %floor,
                    "capped stale watermark"
                );
                *current = floor;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
