//! Per-agent success, failure and timing statistics.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Counters for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Mean duration of successful runs.
    pub avg_time_seconds: f64,
}

/// Thread-safe map of [`PerformanceRecord`]s keyed by agent name.
///
/// Every update takes the lock for the duration of the update only. A
/// disabled tracker ignores updates and reports nothing.
#[derive(Debug)]
pub struct PerformanceTracker {
    enabled: bool,
    records: Mutex<HashMap<String, PerformanceRecord>>,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PerformanceTracker {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start tracking `name` with a fresh record, replacing any old one.
    pub fn register(&self, name: &str) {
        if self.enabled {
            self.records()
                .insert(name.to_string(), PerformanceRecord::default());
        }
    }

    pub fn unregister(&self, name: &str) -> Option<PerformanceRecord> {
        self.records().remove(name)
    }

    /// Count a success and fold `elapsed` into the running mean.
    pub fn record_success(&self, name: &str, elapsed: Duration) {
        self.record_success_secs(name, elapsed.as_secs_f64());
    }

    pub fn record_success_secs(&self, name: &str, elapsed_secs: f64) {
        self.update(name, |record| {
            record.tasks_completed += 1;
            let n = record.tasks_completed as f64;
            record.avg_time_seconds = (record.avg_time_seconds * (n - 1.0) + elapsed_secs) / n;
        });
    }

    /// Count a failure. The mean is left alone.
    pub fn record_failure(&self, name: &str) {
        self.update(name, |record| record.tasks_failed += 1);
    }

    pub fn get(&self, name: &str) -> Option<PerformanceRecord> {
        if !self.enabled {
            return None;
        }
        self.records().get(name).copied()
    }

    /// Copy of every record, sorted by agent name.
    pub fn snapshot(&self) -> BTreeMap<String, PerformanceRecord> {
        if !self.enabled {
            return BTreeMap::new();
        }
        self.records()
            .iter()
            .map(|(name, record)| (name.clone(), *record))
            .collect()
    }

    fn update(&self, name: &str, apply: impl FnOnce(&mut PerformanceRecord)) {
        if !self.enabled {
            return;
        }
        match self.records().get_mut(name) {
            Some(record) => apply(record),
            None => warn!(agent = %name, "Performance update for untracked agent ignored"),
        }
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, PerformanceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
