//! Header, banners, and the statistics block printed around the tree.

use super::style::{paint, BOLD_CYAN, CYAN, GREEN, RED, WHITE, YELLOW};
use crate::collect::SnapshotMetadata;
use crate::tree::{BuildReport, ForestStats};
use chrono::{DateTime, Local, Utc};

/// Width of the `═` rules.
pub const RULE_WIDTH: usize = 70;

pub fn rule() -> String {
    "═".repeat(RULE_WIDTH)
}

/// Title block shown above the tree.
pub fn header_lines(total: usize, captured_at: DateTime<Utc>, color: bool) -> Vec<String> {
    let stamp = captured_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    vec![
        paint(&rule(), BOLD_CYAN, color),
        paint("Process Tree Visualizer", BOLD_CYAN, color),
        paint(&format!("Timestamp: {}", stamp), CYAN, color),
        paint(&format!("Total Processes: {}", total), CYAN, color),
        paint(&rule(), BOLD_CYAN, color),
        String::new(),
    ]
}

/// `Collected N processes`, then `(M inaccessible, K exited)` listing only
/// the non-zero skip counts.
pub fn collection_line(collected: usize, meta: &SnapshotMetadata, color: bool) -> String {
    let mut line = paint(&format!("Collected {} processes", collected), GREEN, color);
    let skipped: Vec<String> = [(meta.inaccessible, "inaccessible"), (meta.vanished, "exited")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();
    if !skipped.is_empty() {
        line.push(' ');
        line.push_str(&paint(&format!("({})", skipped.join(", ")), YELLOW, color));
    }
    line
}

pub fn subtree_banner(name: &str, color: bool) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "{}{}",
            paint("Process Subtree for: ", CYAN, color),
            paint(name, BOLD_CYAN, color)
        ),
        paint(&rule(), CYAN, color),
        String::new(),
    ]
}

pub fn found_banner(matches: usize, color: bool) -> Vec<String> {
    vec![
        paint(&format!("Found {} matching process(es):", matches), GREEN, color),
        String::new(),
    ]
}

pub fn pid_not_found(pid: u32) -> String {
    format!("Process with PID {} not found", pid)
}

pub fn search_not_found(query: &str) -> String {
    format!("No processes found matching '{}'", query)
}

/// Printed once before the first monitor cycle.
pub fn monitor_banner(color: bool) -> Vec<String> {
    vec![
        paint("Entering monitoring mode (Ctrl+C to exit)...", CYAN, color),
        String::new(),
    ]
}

/// Shown in place of a frame when enumeration fails during monitoring.
pub fn source_notice(reason: &str, interval_secs: f64, color: bool) -> String {
    paint(
        &format!(
            "Process source unavailable ({}); retrying in {:.1}s",
            reason, interval_secs
        ),
        YELLOW,
        color,
    )
}

pub fn export_confirmation(path: &str, color: bool) -> String {
    paint(&format!("Process tree exported to {}", path), GREEN, color)
}

pub fn terminated_line(color: bool) -> String {
    paint("Process tree visualizer terminated by user", YELLOW, color)
}

pub fn stats_lines(stats: &ForestStats, color: bool) -> Vec<String> {
    let t = &stats.totals;
    let label = |text: &str| paint(text, WHITE, color);
    vec![
        String::new(),
        paint("Process Statistics:", BOLD_CYAN, color),
        format!("{}{}", label("Total Processes: "), paint(&t.processes.to_string(), GREEN, color)),
        format!("{}{}", label("Root Processes: "), paint(&stats.roots.to_string(), GREEN, color)),
        format!(
            "{}{}",
            label("Total Memory: "),
            paint(&format!("{:.1} MB", t.memory_mb()), YELLOW, color)
        ),
        format!("{}{}", label("Total Threads: "), paint(&t.threads.to_string(), CYAN, color)),
        format!(
            "{}{} | Sleeping: {} | Zombie: {}",
            label("Running: "),
            paint(&t.running.to_string(), GREEN, color),
            paint(&t.sleeping.to_string(), CYAN, color),
            paint(&t.zombie.to_string(), RED, color),
        ),
    ]
}

/// One-line `key=value` digest for `--format summary`.
pub fn summary_line(meta: &SnapshotMetadata, report: &BuildReport, stats: &ForestStats) -> String {
    let t = &stats.totals;
    format!(
        "processes={} roots={} running={} sleeping={} stopped={} zombie={} memory_mb={:.1} threads={} inaccessible={} vanished={} orphans={} cycles_broken={} incomplete={}",
        t.processes,
        stats.roots,
        t.running,
        t.sleeping,
        t.stopped,
        t.zombie,
        t.memory_mb(),
        t.threads,
        meta.inaccessible,
        meta.vanished,
        report.orphans,
        report.cycles_broken,
        report.incomplete,
    )
}
