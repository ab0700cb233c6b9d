//! Snapshot collection: one pass over a [`ProcessSource`].
//!
//! Per-pid failures are counted and skipped; only a failed enumeration aborts
//! the snapshot.

use super::source::{ProcessSource, ReadError, SourceError};
use super::types::ProcessRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, span, Level};

/// Options for snapshot collection.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    /// Drop Linux kernel threads (children of kthreadd) from the snapshot.
    pub hide_kernel_threads: bool,
}

/// Metadata about a collection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Source identifier (procfs, memory).
    pub source: String,

    /// When the snapshot was taken.
    pub captured_at: DateTime<Utc>,

    /// Duration of the collection pass.
    pub duration_ms: u64,

    /// Pids returned by enumeration.
    pub listed: usize,

    /// Records successfully read (before kernel-thread filtering).
    pub collected: usize,

    /// Pids that refused access.
    pub inaccessible: usize,

    /// Pids that exited between enumeration and read.
    pub vanished: usize,

    /// Kernel threads dropped by the filter.
    #[serde(default)]
    pub kernel_threads_hidden: usize,
}

/// A flat process table captured at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<ProcessRecord>,
    pub metadata: SnapshotMetadata,
}

impl Snapshot {
    /// Capture time as Unix seconds, the reference point for uptimes.
    pub fn captured_unix(&self) -> i64 {
        self.metadata.captured_at.timestamp()
    }
}

/// Enumerate and read every process visible to `source`.
///
/// # Errors
/// * `SourceError` if enumeration itself fails
pub fn collect_snapshot<S: ProcessSource + ?Sized>(
    source: &S,
    options: &SnapshotOptions,
) -> Result<Snapshot, SourceError> {
    let _span = span!(Level::DEBUG, "collect_snapshot", source = source.name()).entered();

    let start = Instant::now();
    let captured_at = source.capture_time().unwrap_or_else(Utc::now);

    let pids = source.list_pids()?;
    let listed = pids.len();

    let mut records = Vec::with_capacity(listed);
    let mut inaccessible = 0;
    let mut vanished = 0;

    for pid in pids {
        match source.read(pid) {
            Ok(record) => records.push(record),
            Err(ReadError::AccessDenied(_)) => inaccessible += 1,
            Err(ReadError::NotFound(_)) => vanished += 1,
        }
    }

    let collected = records.len();
    let mut kernel_threads_hidden = 0;
    if options.hide_kernel_threads {
        records.retain(|r| !r.is_kernel_thread());
        kernel_threads_hidden = collected - records.len();
    }

    let duration = start.elapsed();
    debug!(
        listed,
        collected,
        inaccessible,
        vanished,
        kernel_threads_hidden,
        duration_ms = duration.as_millis() as u64,
        "Snapshot collected"
    );

    Ok(Snapshot {
        records,
        metadata: SnapshotMetadata {
            source: source.name().to_string(),
            captured_at,
            duration_ms: duration.as_millis() as u64,
            listed,
            collected,
            inaccessible,
            vanished,
            kernel_threads_hidden,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::MemorySource;
    use pt_common::ProcessId;

    #[test]
    fn test_counts_per_pid_failures() {
        let source = MemorySource::new(vec![
            ProcessRecord::new(1, 0, "init"),
            ProcessRecord::new(10, 1, "shell"),
        ])
        .with_failure(20, ReadError::AccessDenied(ProcessId(20)))
        .with_failure(30, ReadError::NotFound(ProcessId(30)));

        let snap = collect_snapshot(&source, &SnapshotOptions::default()).unwrap();
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.metadata.listed, 4);
        assert_eq!(snap.metadata.collected, 2);
        assert_eq!(snap.metadata.inaccessible, 1);
        assert_eq!(snap.metadata.vanished, 1);
        assert_eq!(snap.metadata.source, "memory");
    }

    #[test]
    fn test_enumeration_failure_is_fatal() {
        let source = MemorySource::default().with_unavailable("denied");
        assert!(collect_snapshot(&source, &SnapshotOptions::default()).is_err());
    }

    #[test]
    fn test_kernel_thread_filter() {
        let source = MemorySource::new(vec![
            ProcessRecord::new(1, 0, "systemd"),
            ProcessRecord::new(2, 0, "kthreadd"),
            ProcessRecord::new(3, 2, "rcu_gp"),
            ProcessRecord::new(400, 1, "sshd"),
        ]);
        let options = SnapshotOptions {
            hide_kernel_threads: true,
        };

        let snap = collect_snapshot(&source, &options).unwrap();
        let pids: Vec<u32> = snap.records.iter().map(|r| r.pid.0).collect();
        assert_eq!(pids, vec![1, 400]);
        assert_eq!(snap.metadata.kernel_threads_hidden, 2);
        assert_eq!(snap.metadata.collected, 4);
    }

    #[test]
    fn test_replayed_capture_time_is_kept() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let source = MemorySource::new(vec![ProcessRecord::new(1, 0, "init")]).with_capture_time(at);

        let snap = collect_snapshot(&source, &SnapshotOptions::default()).unwrap();
        assert_eq!(snap.metadata.captured_at, at);
        assert_eq!(snap.captured_unix(), at.timestamp());
    }
}
