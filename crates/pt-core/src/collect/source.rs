//! The process source capability.

use super::types::ProcessRecord;
use chrono::{DateTime, Utc};
use pt_common::ProcessId;
use std::path::PathBuf;
use thiserror::Error;

/// Enumeration failed wholesale; nothing can be collected this cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot enumerate processes under {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Unavailable(String),
}

/// A single pid could not be read. Never fatal for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("process {0} not found")]
    NotFound(ProcessId),

    #[error("access denied reading process {0}")]
    AccessDenied(ProcessId),
}

/// Something that can list and read processes.
pub trait ProcessSource {
    /// Short identifier used in logs and snapshot metadata.
    fn name(&self) -> &'static str;

    /// All pids currently visible to this source.
    fn list_pids(&self) -> Result<Vec<ProcessId>, SourceError>;

    /// Read one process. Individual attributes degrade to `Missing`.
    fn read(&self, pid: ProcessId) -> Result<ProcessRecord, ReadError>;

    /// Fixed capture time, for sources that replay a recorded table.
    fn capture_time(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl From<SourceError> for pt_common::Error {
    fn from(err: SourceError) -> Self {
        pt_common::Error::SourceUnavailable(err.to_string())
    }
}

impl From<ReadError> for pt_common::Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::NotFound(pid) => pt_common::Error::ProcessNotFound { pid: pid.0 },
            ReadError::AccessDenied(pid) => pt_common::Error::PermissionDenied { pid: pid.0 },
        }
    }
}
