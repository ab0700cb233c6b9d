//! Read-only statistics over a snapshot.

use super::forest::Forest;
use crate::collect::{ProcessRecord, ProcessStatus, StatusClass};
use pt_common::ProcessId;
use serde::Serialize;
use std::collections::HashMap;

/// Counts per display class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub active: usize,
    pub idle: usize,
    pub halted: usize,
    pub unknown: usize,
}

/// Totals that do not depend on tree shape.
///
/// Memory and thread sums saturate at `u64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessTotals {
    pub processes: usize,
    pub memory_bytes: u64,
    pub threads: u64,
    pub classes: ClassCounts,
    pub running: usize,
    pub sleeping: usize,
    pub stopped: usize,
    pub zombie: usize,
}

impl ProcessTotals {
    fn add(&mut self, record: &ProcessRecord) {
        self.processes += 1;
        self.memory_bytes = self.memory_bytes.saturating_add(record.rss());
        self.threads = self.threads.saturating_add(u64::from(record.thread_count()));
        match record.status.class() {
            StatusClass::Active => self.classes.active += 1,
            StatusClass::Idle => self.classes.idle += 1,
            StatusClass::Halted => self.classes.halted += 1,
            StatusClass::Unknown => self.classes.unknown += 1,
        }
        match record.status {
            ProcessStatus::Running => self.running += 1,
            ProcessStatus::Sleeping => self.sleeping += 1,
            ProcessStatus::Stopped => self.stopped += 1,
            ProcessStatus::Zombie => self.zombie += 1,
            ProcessStatus::Unknown => {}
        }
    }

    /// Totals over a flat record set, keeping the last record per pid.
    pub fn from_records(records: &[ProcessRecord]) -> Self {
        let mut latest: HashMap<ProcessId, &ProcessRecord> = HashMap::with_capacity(records.len());
        for record in records {
            latest.insert(record.pid, record);
        }
        let mut totals = Self::default();
        for record in latest.values() {
            totals.add(record);
        }
        totals
    }

    /// Totals over a pre-order walk of the forest.
    pub fn from_forest(forest: &Forest) -> Self {
        let mut totals = Self::default();
        for id in forest.walk() {
            totals.add(&forest.node(id).record);
        }
        totals
    }

    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Totals plus the tree-shaped figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForestStats {
    #[serde(flatten)]
    pub totals: ProcessTotals,
    pub roots: usize,
}

impl ForestStats {
    pub fn compute(forest: &Forest) -> Self {
        Self {
            totals: ProcessTotals::from_forest(forest),
            roots: forest.roots().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_forest;

    fn sample() -> Vec<ProcessRecord> {
        vec![
            ProcessRecord::new(1, 0, "init")
                .with_status(ProcessStatus::Sleeping)
                .with_rss(10 * 1024 * 1024)
                .with_threads(1),
            ProcessRecord::new(10, 1, "shell")
                .with_status(ProcessStatus::Running)
                .with_rss(5 * 1024 * 1024)
                .with_threads(2),
            ProcessRecord::new(11, 10, "defunct").with_status(ProcessStatus::Zombie),
            ProcessRecord::new(12, 10, "job").with_status(ProcessStatus::Stopped),
            ProcessRecord::new(99, 5000, "orphan"),
        ]
    }

    #[test]
    fn test_totals() {
        let totals = ProcessTotals::from_records(&sample());
        assert_eq!(totals.processes, 5);
        assert_eq!(totals.memory_bytes, 15 * 1024 * 1024);
        assert_eq!(totals.threads, 3);
        assert_eq!(totals.running, 1);
        assert_eq!(totals.sleeping, 1);
        assert_eq!(totals.zombie, 1);
        assert_eq!(totals.stopped, 1);
        assert_eq!(
            totals.classes,
            ClassCounts {
                active: 1,
                idle: 1,
                halted: 2,
                unknown: 1
            }
        );
        assert!((totals.memory_mb() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_matches_flat_records() {
        let records = sample();
        let forest = build_forest(records.clone());
        assert_eq!(ProcessTotals::from_forest(&forest), ProcessTotals::from_records(&records));

        let stats = ForestStats::compute(&forest);
        assert_eq!(stats.roots, 2);
    }

    #[test]
    fn test_flat_totals_dedupe_by_pid() {
        let records = vec![
            ProcessRecord::new(5, 0, "a").with_rss(100),
            ProcessRecord::new(5, 0, "b").with_rss(7),
        ];
        let totals = ProcessTotals::from_records(&records);
        assert_eq!(totals.processes, 1);
        assert_eq!(totals.memory_bytes, 7);
    }

    #[test]
    fn test_memory_sum_saturates() {
        let records = vec![
            ProcessRecord::new(1, 0, "huge").with_rss(u64::MAX),
            ProcessRecord::new(2, 1, "small").with_rss(1),
        ];
        let forest = build_forest(records.clone());
        let totals = ProcessTotals::from_forest(&forest);
        assert_eq!(totals.memory_bytes, u64::MAX);
        assert_eq!(totals, ProcessTotals::from_records(&records));
        assert!(ForestStats::compute(&forest).totals.memory_mb() > 0.0);
    }
}
