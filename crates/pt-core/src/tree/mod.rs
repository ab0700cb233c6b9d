//! Process forest: construction, lookup, search, and statistics.

mod builder;
mod forest;
mod search;
mod stats;

pub use builder::build_forest;
pub use forest::{BuildReport, Forest, NodeId, ProcessNode};
pub use search::{find_matches, Query};
pub use stats::{ClassCounts, ForestStats, ProcessTotals};
