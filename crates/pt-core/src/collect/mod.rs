//! Process collection.
//!
//! This module provides the snapshot layer for the process tree:
//! - The `ProcessSource` capability (list pids, read one pid)
//! - A /proc-backed source with a configurable root (Linux-only)
//! - An in-memory source for replayed snapshots and tests
//! - Snapshot assembly with per-pid failure accounting
//!
//! The collection layer produces flat records that feed into the tree builder.

mod memory;
#[cfg(target_os = "linux")]
mod procfs;
mod snapshot;
mod source;
mod types;

pub use memory::MemorySource;
#[cfg(target_os = "linux")]
pub use procfs::{
    parse_passwd, parse_stat_content, parse_uid_from_status, ProcfsSource, StatFields,
    StatParseError, DEFAULT_PROC_ROOT,
};
pub use snapshot::{collect_snapshot, Snapshot, SnapshotMetadata, SnapshotOptions};
pub use source::{ProcessSource, ReadError, SourceError};
pub use types::{
    MissingReason, ProcessRecord, ProcessStatus, Sampled, StatusClass, UNKNOWN_OWNER,
};
