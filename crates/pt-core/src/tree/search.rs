//! Process search by pid or name.

use super::forest::{Forest, NodeId};
use pt_common::ProcessId;

/// A parsed search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Exact pid match.
    Pid(ProcessId),
    /// Case-insensitive substring of the name, kept as typed.
    Name(String),
}

impl Query {
    /// An unsigned integer is a pid; anything else is a name fragment.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<u32>() {
            Ok(pid) => Query::Pid(ProcessId(pid)),
            Err(_) => Query::Name(input.to_string()),
        }
    }

    pub fn matches(&self, pid: ProcessId, name: &str) -> bool {
        match self {
            Query::Pid(target) => *target == pid,
            Query::Name(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Pid(pid) => write!(f, "{}", pid),
            Query::Name(name) => f.write_str(name),
        }
    }
}

/// Matching nodes in ascending pid order. Empty when nothing matches.
pub fn find_matches(forest: &Forest, query: &Query) -> Vec<NodeId> {
    match query {
        Query::Pid(pid) => forest.find(*pid).into_iter().collect(),
        Query::Name(needle) => {
            let needle = needle.to_lowercase();
            forest
                .nodes()
                .filter(|(_, node)| node.record.name.to_lowercase().contains(&needle))
                .map(|(id, _)| id)
                .collect()
        }
    }
}
