//! In-memory process source.
//!
//! Backs snapshot replay (`--replay`) and lets tests inject per-pid read
//! failures or a wholesale enumeration failure.

use super::source::{ProcessSource, ReadError, SourceError};
use super::types::ProcessRecord;
use chrono::{DateTime, Utc};
use pt_common::ProcessId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<ProcessRecord>,
    failures: HashMap<ProcessId, ReadError>,
    unavailable: Option<String>,
    captured_at: Option<DateTime<Utc>>,
}

impl MemorySource {
    pub fn new(records: Vec<ProcessRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Make `read(pid)` fail. The pid is still listed.
    pub fn with_failure(mut self, pid: u32, err: ReadError) -> Self {
        self.failures.insert(ProcessId(pid), err);
        self
    }

    /// Make `list_pids` fail with `SourceError::Unavailable`.
    pub fn with_unavailable(mut self, message: impl Into<String>) -> Self {
        self.unavailable = Some(message.into());
        self
    }

    pub fn with_capture_time(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }
}

impl ProcessSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list_pids(&self) -> Result<Vec<ProcessId>, SourceError> {
        if let Some(message) = &self.unavailable {
            return Err(SourceError::Unavailable(message.clone()));
        }

        let mut seen = HashSet::new();
        let mut pids: Vec<ProcessId> = self
            .records
            .iter()
            .map(|r| r.pid)
            .filter(|pid| seen.insert(*pid))
            .collect();

        let mut injected: Vec<ProcessId> = self
            .failures
            .keys()
            .copied()
            .filter(|pid| !seen.contains(pid))
            .collect();
        injected.sort();
        pids.extend(injected);

        Ok(pids)
    }

    fn read(&self, pid: ProcessId) -> Result<ProcessRecord, ReadError> {
        if let Some(err) = self.failures.get(&pid) {
            return Err(*err);
        }
        self.records
            .iter()
            .rev()
            .find(|r| r.pid == pid)
            .cloned()
            .ok_or(ReadError::NotFound(pid))
    }

    fn capture_time(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_read() {
        let source = MemorySource::new(vec![
            ProcessRecord::new(1, 0, "init"),
            ProcessRecord::new(10, 1, "shell"),
        ]);
        assert_eq!(source.list_pids().unwrap(), vec![ProcessId(1), ProcessId(10)]);
        assert_eq!(source.read(ProcessId(10)).unwrap().name, "shell");
        assert_eq!(
            source.read(ProcessId(99)),
            Err(ReadError::NotFound(ProcessId(99)))
        );
    }

    #[test]
    fn test_injected_failure_is_listed() {
        let source = MemorySource::new(vec![ProcessRecord::new(1, 0, "init")])
            .with_failure(7, ReadError::AccessDenied(ProcessId(7)));
        assert_eq!(source.list_pids().unwrap(), vec![ProcessId(1), ProcessId(7)]);
        assert_eq!(
            source.read(ProcessId(7)),
            Err(ReadError::AccessDenied(ProcessId(7)))
        );
    }

    #[test]
    fn test_unavailable() {
        let source = MemorySource::default().with_unavailable("no permission");
        let err = source.list_pids().unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert_eq!(err.to_string(), "no permission");
    }

    #[test]
    fn test_duplicate_pid_reads_latest() {
        let source = MemorySource::new(vec![
            ProcessRecord::new(5, 1, "old"),
            ProcessRecord::new(5, 1, "new"),
        ]);
        assert_eq!(source.list_pids().unwrap(), vec![ProcessId(5)]);
        assert_eq!(source.read(ProcessId(5)).unwrap().name, "new");
    }
}
