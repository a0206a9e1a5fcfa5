//! Per-cell activity records with linear fade.

use std::collections::BTreeMap;
use std::time::Duration;

use runwatch_models::BehaviorStatus;

use crate::zones::CellId;

/// Latest activity observed in one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRecord {
    pub last_active: Duration,
    pub status: BehaviorStatus,
    /// Number of non-quiet reports
    pub trigger_count: u32,
}

impl Default for ActivityRecord {
    fn default() -> Self {
        Self {
            last_active: Duration::ZERO,
            status: BehaviorStatus::Quiet,
            trigger_count: 0,
        }
    }
}

/// Activity per grid cell, for overlay rendering.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    records: BTreeMap<CellId, ActivityRecord>,
    fade: Duration,
}

impl ActivityTracker {
    pub fn new(fade: Duration) -> Self {
        Self {
            records: BTreeMap::new(),
            fade,
        }
    }

    pub fn record(&mut self, cell: CellId, status: BehaviorStatus, now: Duration) -> &ActivityRecord {
        let record = self.records.entry(cell).or_default();
        record.last_active = now;
        record.status = status;
        if status != BehaviorStatus::Quiet {
            record.trigger_count += 1;
        }
        record
    }

    pub fn get(&self, cell: CellId) -> Option<&ActivityRecord> {
        self.records.get(&cell)
    }

    /// Overlay opacity in `[0, 1]`: 1 at the moment of activity, 0 once the
    /// fade window has passed.
    pub fn opacity(&self, cell: CellId, now: Duration) -> f64 {
        self.records
            .get(&cell)
            .map(|r| self.fade_at(r, now))
            .unwrap_or(0.0)
    }

    pub fn is_active(&self, cell: CellId, now: Duration) -> bool {
        self.records
            .get(&cell)
            .is_some_and(|r| now.saturating_sub(r.last_active) < self.fade)
    }

    /// Cells still within the fade window with their opacity.
    pub fn active_cells(&self, now: Duration) -> Vec<(CellId, &ActivityRecord, f64)> {
        self.records
            .iter()
            .filter(|(_, r)| now.saturating_sub(r.last_active) < self.fade)
            .map(|(cell, r)| (*cell, r, self.fade_at(r, now)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    fn fade_at(&self, record: &ActivityRecord, now: Duration) -> f64 {
        if self.fade.is_zero() {
            return 0.0;
        }
        let elapsed = now.saturating_sub(record.last_active);
        (1.0 - elapsed.as_secs_f64() / self.fade.as_secs_f64()).clamp(0.0, 1.0)
    }
}
