//! Pure styling decisions: status colours and severity tiers.
//!
//! Styles are raw ANSI SGR sequences. Nothing here looks at the terminal;
//! callers decide whether to apply them.

use crate::collect::{ProcessStatus, StatusClass};
use serde::{Deserialize, Serialize};

pub const RESET: &str = "\x1b[0m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const WHITE: &str = "\x1b[37m";
pub const BOLD_CYAN: &str = "\x1b[1;36m";
pub const DIM_WHITE: &str = "\x1b[2;37m";

const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_WHITE: &str = "\x1b[1;37m";

/// Severity of a resource figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Normal,
    Medium,
    High,
}

/// Tier boundaries; a value at or above a boundary is in that tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub memory_high_mb: f64,
    pub memory_medium_mb: f64,
    pub cpu_high_percent: f64,
    pub cpu_medium_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            memory_high_mb: 500.0,
            memory_medium_mb: 100.0,
            cpu_high_percent: 50.0,
            cpu_medium_percent: 10.0,
        }
    }
}

fn tier(value: f64, medium: f64, high: f64) -> Tier {
    if value >= high {
        Tier::High
    } else if value >= medium {
        Tier::Medium
    } else {
        Tier::Normal
    }
}

pub fn memory_tier(rss_bytes: u64, thresholds: &Thresholds) -> Tier {
    let mb = rss_bytes as f64 / (1024.0 * 1024.0);
    tier(mb, thresholds.memory_medium_mb, thresholds.memory_high_mb)
}

pub fn cpu_tier(percent: f64, thresholds: &Thresholds) -> Tier {
    tier(percent, thresholds.cpu_medium_percent, thresholds.cpu_high_percent)
}

pub fn memory_style(tier: Tier) -> &'static str {
    match tier {
        Tier::High => RED,
        Tier::Medium => YELLOW,
        Tier::Normal => WHITE,
    }
}

pub fn cpu_style(tier: Tier) -> &'static str {
    match tier {
        Tier::High => RED,
        Tier::Medium => GREEN,
        Tier::Normal => WHITE,
    }
}

/// Bold name colour for a status class.
pub fn class_style(class: StatusClass) -> &'static str {
    match class {
        StatusClass::Active => BOLD_GREEN,
        StatusClass::Idle => BOLD_CYAN,
        StatusClass::Halted => BOLD_RED,
        StatusClass::Unknown => BOLD_WHITE,
    }
}

pub fn status_style(status: ProcessStatus) -> &'static str {
    class_style(status.class())
}

/// Wrap `text` in `style` when colour is on.
pub fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", style, text, RESET)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_memory_tiers_inclusive() {
        let t = Thresholds::default();
        assert_eq!(memory_tier(0, &t), Tier::Normal);
        assert_eq!(memory_tier(100 * MIB - 1, &t), Tier::Normal);
        assert_eq!(memory_tier(100 * MIB, &t), Tier::Medium);
        assert_eq!(memory_tier(499 * MIB, &t), Tier::Medium);
        assert_eq!(memory_tier(500 * MIB, &t), Tier::High);
    }

    #[test]
    fn test_cpu_tiers_inclusive() {
        let t = Thresholds::default();
        assert_eq!(cpu_tier(9.99, &t), Tier::Normal);
        assert_eq!(cpu_tier(10.0, &t), Tier::Medium);
        assert_eq!(cpu_tier(50.0, &t), Tier::High);
        assert_eq!(cpu_tier(250.0, &t), Tier::High);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            memory_high_mb: 2.0,
            memory_medium_mb: 1.0,
            ..Thresholds::default()
        };
        assert_eq!(memory_tier(MIB, &t), Tier::Medium);
        assert_eq!(memory_tier(2 * MIB, &t), Tier::High);
    }

    #[test]
    fn test_status_styles() {
        assert_eq!(status_style(ProcessStatus::Running), BOLD_GREEN);
        assert_eq!(status_style(ProcessStatus::Sleeping), BOLD_CYAN);
        assert_eq!(status_style(ProcessStatus::Zombie), BOLD_RED);
        assert_eq!(status_style(ProcessStatus::Stopped), BOLD_RED);
        assert_eq!(status_style(ProcessStatus::Unknown), BOLD_WHITE);
    }

    #[test]
    fn test_paint() {
        assert_eq!(paint("x", RED, false), "x");
        assert_eq!(paint("x", RED, true), "\x1b[31mx\x1b[0m");
    }
}
