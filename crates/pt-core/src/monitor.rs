//! Continuous monitoring: collect, build, render, sleep, repeat.
//!
//! Each cycle starts from a fresh snapshot. The loop is cooperative: `stop`
//! is polled before each cycle, between top-level roots while rendering, and
//! between sleep slices.

use crate::collect::{collect_snapshot, ProcessSource, SnapshotOptions};
use crate::render::{not_found_message, summary, write_frame, FrameOutcome, FrameRequest};
use crate::tree::build_forest;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};

/// Longest uninterrupted sleep between stop checks.
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// ANSI clear-screen plus cursor-home.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub interval: Duration,
    /// Emit [`CLEAR_SCREEN`] before each cycle (stdout is a terminal).
    pub clear_screen: bool,
    /// Stop after this many cycles; `None` runs until interrupted.
    pub max_cycles: Option<u64>,
    pub snapshot: SnapshotOptions,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            clear_screen: false,
            max_cycles: None,
            snapshot: SnapshotOptions::default(),
        }
    }
}

/// What happened over the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub cycles: u64,
    /// Cycles where enumeration failed.
    pub failed_cycles: u64,
    pub interrupted: bool,
}

/// Run the monitor loop until `stop` returns true or `max_cycles` is reached.
///
/// `frame.options.now` is replaced each cycle by the snapshot capture time.
/// Enumeration failures are logged, reported inline, and retried on the next
/// interval; only write errors end the loop early.
pub fn run_monitor<S, W, F>(
    source: &S,
    out: &mut W,
    frame: &FrameRequest<'_>,
    options: &MonitorOptions,
    stop: F,
) -> io::Result<MonitorReport>
where
    S: ProcessSource + ?Sized,
    W: Write,
    F: Fn() -> bool,
{
    let mut report = MonitorReport::default();
    let interval_secs = options.interval.as_secs_f64();

    for line in summary::monitor_banner(frame.color) {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    loop {
        if stop() {
            report.interrupted = true;
            break;
        }
        report.cycles += 1;
        let _span = span!(Level::DEBUG, "monitor_cycle", cycle = report.cycles).entered();

        if options.clear_screen {
            write!(out, "{}", CLEAR_SCREEN)?;
        }

        match collect_snapshot(source, &options.snapshot) {
            Ok(snapshot) => {
                let forest = build_forest(snapshot.records.clone());
                let mut render_options = frame.options.clone();
                render_options.now = snapshot.captured_unix();
                let request = FrameRequest {
                    options: &render_options,
                    ..frame.clone()
                };

                match write_frame(out, &snapshot, &forest, &request, &stop)? {
                    FrameOutcome::Rendered { lines } => {
                        debug!(lines, processes = forest.len(), "Cycle rendered");
                    }
                    FrameOutcome::NotFound => {
                        if let Some(message) = not_found_message(frame.mode) {
                            writeln!(out, "{}", message)?;
                            out.flush()?;
                        }
                    }
                    FrameOutcome::Interrupted => {
                        report.interrupted = true;
                        break;
                    }
                }
            }
            Err(err) => {
                report.failed_cycles += 1;
                warn!(error = %err, cycle = report.cycles, "Process source unavailable; will retry");
                writeln!(
                    out,
                    "{}",
                    summary::source_notice(&err.to_string(), interval_secs, frame.color)
                )?;
                out.flush()?;
            }
        }

        if options.max_cycles.is_some_and(|max| report.cycles >= max) {
            break;
        }
        if sleep_unless_stopped(options.interval, &stop) {
            report.interrupted = true;
            break;
        }
    }

    info!(
        cycles = report.cycles,
        failed = report.failed_cycles,
        interrupted = report.interrupted,
        "Monitor finished"
    );
    Ok(report)
}

/// Sleep for `interval` in slices; true if `stop` fired first.
fn sleep_unless_stopped<F: Fn() -> bool>(interval: Duration, stop: &F) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}
