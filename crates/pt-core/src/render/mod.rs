//! Tree rendering.
//!
//! - Mode selection (full forest, subtree by pid, search)
//! - Lazy line generation with connector/indent protocol
//! - Pure styling and severity tiers
//! - Page composition (header, banners, statistics)

mod format;
mod frame;
mod lines;
pub mod style;
pub mod summary;

pub use format::{format_memory, format_uptime, truncate_cmdline};
pub use frame::{write_frame, FrameOutcome, FrameRequest};
pub use lines::{LineKind, RenderOptions, Span, TreeLine, TreeLines};
pub use style::{Thresholds, Tier};

use crate::tree::{find_matches, Forest, NodeId, Query};
use pt_common::ProcessId;

/// What to render from a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    Full,
    Subtree(ProcessId),
    Search(Query),
}

/// Start nodes for each traversal, or nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One entry per independent traversal.
    Found(Vec<Vec<NodeId>>),
    NotFound,
}

/// Resolve a mode against a forest.
///
/// Full mode is one traversal over every root (an empty forest renders
/// nothing but is still `Found`). Each search match gets its own traversal.
pub fn select(forest: &Forest, mode: &RenderMode) -> Selection {
    match mode {
        RenderMode::Full => Selection::Found(vec![forest.roots().to_vec()]),
        RenderMode::Subtree(pid) => match forest.find(*pid) {
            Some(id) => Selection::Found(vec![vec![id]]),
            None => Selection::NotFound,
        },
        RenderMode::Search(query) => {
            let matches = find_matches(forest, query);
            if matches.is_empty() {
                Selection::NotFound
            } else {
                Selection::Found(matches.into_iter().map(|id| vec![id]).collect())
            }
        }
    }
}

/// Message for a `NotFound` outcome; full mode never misses.
pub fn not_found_message(mode: &RenderMode) -> Option<String> {
    match mode {
        RenderMode::Full => None,
        RenderMode::Subtree(pid) => Some(summary::pid_not_found(pid.0)),
        RenderMode::Search(query) => Some(summary::search_not_found(&query.to_string())),
    }
}

/// The error carried by a `NotFound` outcome, for structured reporting.
pub fn not_found_error(mode: &RenderMode) -> Option<pt_common::Error> {
    match mode {
        RenderMode::Full => None,
        RenderMode::Subtree(pid) => Some(pt_common::Error::ProcessNotFound { pid: pid.0 }),
        RenderMode::Search(query) => Some(pt_common::Error::NoMatch {
            query: query.to_string(),
        }),
    }
}

/// All lines of a selection, traversals concatenated in order.
pub fn render_selection<'a>(
    forest: &'a Forest,
    selection: &Selection,
    options: &'a RenderOptions,
) -> Vec<TreeLine> {
    match selection {
        Selection::NotFound => Vec::new(),
        Selection::Found(traversals) => traversals
            .iter()
            .flat_map(|starts| TreeLines::new(forest, starts.clone(), options))
            .collect(),
    }
}
