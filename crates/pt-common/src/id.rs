//! Process identity type.
//!
//! A pid is the unique key of a record within one snapshot. Pid 0 is reserved
//! as the "no known parent" marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// The "no known parent" marker.
    pub const NONE: ProcessId = ProcessId(0);

    /// Whether this pid is the "no known parent" marker.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(ProcessId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_display() {
        assert_eq!(ProcessId(1234).to_string(), "1234");
    }

    #[test]
    fn test_process_id_parse() {
        assert_eq!("42".parse::<ProcessId>().unwrap(), ProcessId(42));
        assert_eq!(" 7 ".parse::<ProcessId>().unwrap(), ProcessId(7));
        assert!("-1".parse::<ProcessId>().is_err());
        assert!("bash".parse::<ProcessId>().is_err());
    }

    #[test]
    fn test_process_id_ordering() {
        let mut pids = vec![ProcessId(30), ProcessId(2), ProcessId(10)];
        pids.sort();
        assert_eq!(pids, vec![ProcessId(2), ProcessId(10), ProcessId(30)]);
    }

    #[test]
    fn test_none_marker() {
        assert!(ProcessId::NONE.is_none());
        assert!(!ProcessId(1).is_none());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&ProcessId(99)).unwrap();
        assert_eq!(json, "99");
        let back: ProcessId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProcessId(99));
    }
}
