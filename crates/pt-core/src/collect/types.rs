//! Common types for process collection.
//!
//! A [`ProcessRecord`] is one row of a process table snapshot. Attributes
//! that can fail independently of the rest of the record are wrapped in
//! [`Sampled`] so that a partially readable process still contributes to the
//! tree.

use pt_common::ProcessId;
use serde::{Deserialize, Serialize};

/// Process state as reported by the OS.
///
/// Maps from standard Unix state characters:
/// - R: Running or runnable
/// - S, D, I: Sleeping (interruptible, uninterruptible, idle)
/// - T, t: Stopped (by job control or trace)
/// - Z: Zombie (terminated but not reaped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Stopped,
    Zombie,
    #[default]
    Unknown,
}

impl ProcessStatus {
    /// Parse process state from single character.
    pub fn from_char(c: char) -> Self {
        match c {
            'R' => ProcessStatus::Running,
            'S' | 'D' | 'I' => ProcessStatus::Sleeping,
            'T' | 't' => ProcessStatus::Stopped,
            'Z' => ProcessStatus::Zombie,
            _ => ProcessStatus::Unknown,
        }
    }

    /// Display class used for colouring.
    pub fn class(self) -> StatusClass {
        match self {
            ProcessStatus::Running => StatusClass::Active,
            ProcessStatus::Sleeping => StatusClass::Idle,
            ProcessStatus::Stopped | ProcessStatus::Zombie => StatusClass::Halted,
            ProcessStatus::Unknown => StatusClass::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessStatus::Running => "running",
            ProcessStatus::Sleeping => "sleeping",
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Zombie => "zombie",
            ProcessStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of statuses for display and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Active,
    Idle,
    Halted,
    Unknown,
}

/// Why an attribute has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// The source never tried to read it.
    NotSampled,
    /// The process exited while its attributes were being read.
    Exited,
    /// The OS refused access.
    AccessDenied,
    /// The value was read but could not be parsed.
    Unparseable,
}

/// An attribute that was either read from the OS or is missing for a known reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampled<T> {
    Value(T),
    Missing(MissingReason),
}

impl<T> Sampled<T> {
    /// Wrap an optional value, recording `reason` when it is absent.
    pub fn from_option(value: Option<T>, reason: MissingReason) -> Self {
        match value {
            Some(v) => Sampled::Value(v),
            None => Sampled::Missing(reason),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Sampled::Value(v) => Some(v),
            Sampled::Missing(_) => None,
        }
    }

    pub fn missing_reason(&self) -> Option<MissingReason> {
        match self {
            Sampled::Value(_) => None,
            Sampled::Missing(reason) => Some(*reason),
        }
    }

    /// Missing for a reason other than never having been sampled.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Sampled::Missing(reason) if *reason != MissingReason::NotSampled)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sampled<U> {
        match self {
            Sampled::Value(v) => Sampled::Value(f(v)),
            Sampled::Missing(reason) => Sampled::Missing(reason),
        }
    }
}

impl<T: Copy> Sampled<T> {
    pub fn get_or(&self, default: T) -> T {
        match self {
            Sampled::Value(v) => *v,
            Sampled::Missing(_) => default,
        }
    }
}

impl<T> Default for Sampled<T> {
    fn default() -> Self {
        Sampled::Missing(MissingReason::NotSampled)
    }
}

/// Owner shown when the owner could not be determined.
pub const UNKNOWN_OWNER: &str = "<unknown>";

/// A single process record from a snapshot.
///
/// Records are immutable once captured; a later snapshot is a wholly new set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Process ID.
    pub pid: ProcessId,

    /// Parent process ID (0 when there is no known parent).
    pub ppid: ProcessId,

    /// Command name.
    pub name: String,

    /// Owning user name.
    #[serde(default)]
    pub user: Sampled<String>,

    /// Current process state.
    #[serde(default)]
    pub status: ProcessStatus,

    /// CPU usage percentage.
    #[serde(default)]
    pub cpu_percent: Sampled<f64>,

    /// Resident set size in bytes.
    #[serde(default)]
    pub rss_bytes: Sampled<u64>,

    /// Number of threads.
    #[serde(default)]
    pub threads: Sampled<u32>,

    /// Process creation time (Unix timestamp, seconds).
    #[serde(default)]
    pub start_time: Sampled<i64>,

    /// Full command line, arguments joined with spaces.
    #[serde(default)]
    pub cmdline: String,
}

impl ProcessRecord {
    /// A record with only identity filled in; every sampled field is `NotSampled`.
    pub fn new(pid: u32, ppid: u32, name: impl Into<String>) -> Self {
        Self {
            pid: ProcessId(pid),
            ppid: ProcessId(ppid),
            name: name.into(),
            user: Sampled::default(),
            status: ProcessStatus::Unknown,
            cpu_percent: Sampled::default(),
            rss_bytes: Sampled::default(),
            threads: Sampled::default(),
            start_time: Sampled::default(),
            cmdline: String::new(),
        }
    }

    pub fn with_status(mut self, status: ProcessStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Sampled::Value(user.into());
        self
    }

    pub fn with_cpu(mut self, percent: f64) -> Self {
        self.cpu_percent = Sampled::Value(percent);
        self
    }

    pub fn with_rss(mut self, bytes: u64) -> Self {
        self.rss_bytes = Sampled::Value(bytes);
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Sampled::Value(threads);
        self
    }

    pub fn with_start_time(mut self, unix_secs: i64) -> Self {
        self.start_time = Sampled::Value(unix_secs);
        self
    }

    pub fn with_cmdline(mut self, cmdline: impl Into<String>) -> Self {
        self.cmdline = cmdline.into();
        self
    }

    pub fn owner(&self) -> &str {
        self.user.value().map(String::as_str).unwrap_or(UNKNOWN_OWNER)
    }

    pub fn cpu(&self) -> f64 {
        self.cpu_percent.get_or(0.0)
    }

    pub fn rss(&self) -> u64 {
        self.rss_bytes.get_or(0)
    }

    pub fn thread_count(&self) -> u32 {
        self.threads.get_or(0)
    }

    /// Resident memory in MiB.
    pub fn memory_mb(&self) -> f64 {
        self.rss() as f64 / (1024.0 * 1024.0)
    }

    /// Whether any attribute is missing for a reason other than `NotSampled`.
    pub fn is_incomplete(&self) -> bool {
        self.user.is_degraded()
            || self.cpu_percent.is_degraded()
            || self.rss_bytes.is_degraded()
            || self.threads.is_degraded()
            || self.start_time.is_degraded()
    }

    /// Linux kernel threads hang off kthreadd (pid 2) or have no parent at all.
    pub fn is_kernel_thread(&self) -> bool {
        if self.pid.0 == 1 {
            return false;
        }
        self.ppid.0 == 0 || self.ppid.0 == 2
    }
}
