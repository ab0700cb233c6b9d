//! Process source backed by the Linux /proc filesystem.
//!
//! The root directory is configurable so a fake tree can stand in for /proc.
//! Per-process reads are best-effort: `stat` is required, everything else
//! degrades to a `Missing` attribute.
//!
//! CPU percentage is the lifetime average (total CPU time over wall time since
//! process start), the same figure `ps` reports.

use super::source::{ProcessSource, ReadError, SourceError};
use super::types::{MissingReason, ProcessRecord, ProcessStatus, Sampled};
use pt_common::ProcessId;
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default location of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

const PASSWD_PATH: &str = "/etc/passwd";

/// Errors parsing `/proc/<pid>/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatParseError {
    #[error("missing comm delimiters")]
    MissingComm,

    #[error("stat content truncated after comm")]
    Truncated,

    #[error("unparseable {0} field")]
    BadField(&'static str),
}

/// Fields extracted from `/proc/<pid>/stat`.
///
/// Only state and ppid are required; the rest are `None` when absent or malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub comm: String,
    pub state: char,
    pub ppid: u32,
    pub utime: Option<u64>,
    pub stime: Option<u64>,
    pub num_threads: Option<u32>,
    pub starttime: Option<u64>,
    pub rss_pages: Option<i64>,
}

/// Parse `/proc/<pid>/stat` content.
///
/// Format: pid (comm) state ppid pgrp session tty_nr tpgid flags
///         minflt cminflt majflt cmajflt utime stime cutime cstime
///         priority nice num_threads itrealvalue starttime vsize rss ...
pub fn parse_stat_content(content: &str) -> Result<StatFields, StatParseError> {
    // comm may contain spaces and parentheses; it ends at the last ')'
    let comm_start = content.find('(').ok_or(StatParseError::MissingComm)?;
    let comm_end = content.rfind(')').ok_or(StatParseError::MissingComm)?;
    if comm_end < comm_start {
        return Err(StatParseError::MissingComm);
    }

    let comm = content[comm_start + 1..comm_end].to_string();
    let after_comm = content
        .get(comm_end + 1..)
        .ok_or(StatParseError::Truncated)?;

    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(StatParseError::Truncated);
    }

    let state = fields[0].chars().next().ok_or(StatParseError::BadField("state"))?;
    let ppid: u32 = fields[1]
        .parse()
        .map_err(|_| StatParseError::BadField("ppid"))?;

    let field = |idx: usize| fields.get(idx).copied();

    Ok(StatFields {
        comm,
        state,
        ppid,
        utime: field(11).and_then(|s| s.parse().ok()),
        stime: field(12).and_then(|s| s.parse().ok()),
        num_threads: field(17).and_then(|s| s.parse().ok()),
        starttime: field(19).and_then(|s| s.parse().ok()),
        rss_pages: field(21).and_then(|s| s.parse().ok()),
    })
}

/// Parse the real UID from `/proc/<pid>/status`.
pub fn parse_uid_from_status(content: &str) -> Option<u32> {
    content
        .lines()
        .find(|line| line.starts_with("Uid:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|uid| uid.parse().ok())
}

/// Build a uid → name table from passwd content.
pub fn parse_passwd(content: &str) -> HashMap<u32, String> {
    let mut users = HashMap::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() >= 3 {
            if let Ok(uid) = fields[2].parse::<u32>() {
                users.entry(uid).or_insert_with(|| fields[0].to_string());
            }
        }
    }
    users
}

/// `/proc/<pid>/cmdline` is NUL-separated; join arguments with spaces.
fn parse_cmdline(raw: &[u8]) -> String {
    raw.split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_error(pid: ProcessId, err: &io::Error) -> ReadError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => ReadError::AccessDenied(pid),
        _ => ReadError::NotFound(pid),
    }
}

fn missing_reason(err: &io::Error) -> MissingReason {
    match err.kind() {
        io::ErrorKind::NotFound => MissingReason::Exited,
        io::ErrorKind::PermissionDenied => MissingReason::AccessDenied,
        _ => MissingReason::Unparseable,
    }
}

fn read_uptime_seconds(root: &Path) -> Option<f64> {
    let content = fs::read_to_string(root.join("uptime")).ok()?;
    content.split_whitespace().next()?.parse::<f64>().ok()
}

fn read_boot_time_unix(root: &Path) -> Option<i64> {
    let content = fs::read_to_string(root.join("stat")).ok()?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("btime"))
        .and_then(|rest| rest.trim().parse::<i64>().ok())
}

/// System clock ticks per second.
fn clk_tck() -> u64 {
    static CLK_TCK: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *CLK_TCK.get_or_init(|| {
        let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if tck > 0 {
            tck as u64
        } else {
            100
        }
    })
}

fn page_size() -> u64 {
    static PAGE_SIZE: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *PAGE_SIZE.get_or_init(|| {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as u64
        } else {
            4096
        }
    })
}

/// Lifetime average CPU usage in percent.
fn lifetime_cpu_percent(utime: u64, stime: u64, starttime: u64, uptime: f64, tck: u64) -> f64 {
    let tck = tck as f64;
    let elapsed = uptime - starttime as f64 / tck;
    if elapsed <= 0.0 {
        return 0.0;
    }
    (utime.saturating_add(stime) as f64 / tck / elapsed * 100.0).max(0.0)
}

/// Reads processes from a proc filesystem rooted at a configurable path.
#[derive(Debug)]
pub struct ProcfsSource {
    root: PathBuf,
    users: HashMap<u32, String>,
    boot_time: Option<i64>,
    uptime: Cell<Option<f64>>,
    clk_tck: u64,
    page_size: u64,
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let boot_time = read_boot_time_unix(&root);
        let users = fs::read_to_string(PASSWD_PATH)
            .map(|content| parse_passwd(&content))
            .unwrap_or_default();
        Self {
            root,
            users,
            boot_time,
            uptime: Cell::new(None),
            clk_tck: clk_tck(),
            page_size: page_size(),
        }
    }

    /// Resolve user names from a different passwd file.
    pub fn with_passwd(mut self, path: impl AsRef<Path>) -> Self {
        self.users = fs::read_to_string(path)
            .map(|content| parse_passwd(&content))
            .unwrap_or_default();
        self
    }

    /// Override clock ticks and page size (fixtures are written for 100 Hz / 4 KiB).
    pub fn with_units(mut self, clk_tck: u64, page_size: u64) -> Self {
        self.clk_tck = clk_tck.max(1);
        self.page_size = page_size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn uptime(&self) -> Option<f64> {
        if let Some(uptime) = self.uptime.get() {
            return Some(uptime);
        }
        let uptime = read_uptime_seconds(&self.root);
        self.uptime.set(uptime);
        uptime
    }

    fn username(&self, uid: u32) -> String {
        self.users
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }

    fn read_user(&self, dir: &Path) -> Sampled<String> {
        match fs::read_to_string(dir.join("status")) {
            Ok(content) => Sampled::from_option(
                parse_uid_from_status(&content).map(|uid| self.username(uid)),
                MissingReason::Unparseable,
            ),
            Err(e) => Sampled::Missing(missing_reason(&e)),
        }
    }
}

impl ProcessSource for ProcfsSource {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn list_pids(&self) -> Result<Vec<ProcessId>, SourceError> {
        let entries = fs::read_dir(&self.root).map_err(|source| SourceError::Enumerate {
            path: self.root.clone(),
            source,
        })?;

        let mut pids: Vec<ProcessId> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .map(ProcessId)
            .collect();
        pids.sort();

        // One uptime reading per enumeration keeps CPU figures consistent
        self.uptime.set(read_uptime_seconds(&self.root));

        Ok(pids)
    }

    fn read(&self, pid: ProcessId) -> Result<ProcessRecord, ReadError> {
        let dir = self.root.join(pid.0.to_string());

        let content = fs::read_to_string(dir.join("stat")).map_err(|e| read_error(pid, &e))?;
        let stat = parse_stat_content(&content).map_err(|e| {
            debug!(pid = pid.0, error = %e, "unparseable stat, treating as exited");
            ReadError::NotFound(pid)
        })?;

        let cmdline = fs::read(dir.join("cmdline"))
            .map(|raw| parse_cmdline(&raw))
            .unwrap_or_default();

        let cpu_percent = match (stat.utime, stat.stime, stat.starttime) {
            (Some(utime), Some(stime), Some(starttime)) => match self.uptime() {
                Some(uptime) => Sampled::Value(lifetime_cpu_percent(
                    utime,
                    stime,
                    starttime,
                    uptime,
                    self.clk_tck,
                )),
                None => Sampled::Missing(MissingReason::NotSampled),
            },
            _ => Sampled::Missing(MissingReason::Unparseable),
        };

        let start_time = match (stat.starttime, self.boot_time) {
            (Some(starttime), Some(btime)) => {
                Sampled::Value(btime.saturating_add((starttime / self.clk_tck) as i64))
            }
            (None, _) => Sampled::Missing(MissingReason::Unparseable),
            (Some(_), None) => Sampled::Missing(MissingReason::NotSampled),
        };

        let page_size = self.page_size;
        Ok(ProcessRecord {
            pid,
            ppid: ProcessId(stat.ppid),
            user: self.read_user(&dir),
            status: ProcessStatus::from_char(stat.state),
            cpu_percent,
            rss_bytes: Sampled::from_option(stat.rss_pages, MissingReason::Unparseable)
                .map(|pages| (pages.max(0) as u64).saturating_mul(page_size)),
            threads: Sampled::from_option(stat.num_threads, MissingReason::Unparseable),
            start_time,
            cmdline,
            name: stat.comm,
        })
    }
}
