//! Arena-backed process forest.
//!
//! Nodes live in one `Vec` ordered by ascending pid. Children are stored as
//! index lists on the parent; there is no child → parent link.

use crate::collect::ProcessRecord;
use pt_common::ProcessId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a node in a [`Forest`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A process record plus its ordered children.
#[derive(Debug, Clone)]
pub struct ProcessNode {
    pub record: ProcessRecord,
    pub(crate) children: Vec<NodeId>,
}

impl ProcessNode {
    pub fn pid(&self) -> ProcessId {
        self.record.pid
    }

    /// Children in ascending pid order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// What the builder had to repair while building a forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Records in the input, duplicates included.
    pub records: usize,

    /// Earlier records replaced by a later one with the same pid.
    pub duplicates_replaced: usize,

    /// Records whose non-zero parent pid was not in the record set.
    pub orphans: usize,

    /// Parent links dropped to break a cycle.
    pub cycles_broken: usize,

    /// Records with an attribute missing for a reason other than not sampled.
    pub incomplete: usize,
}

/// Immutable process forest built from one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub(crate) nodes: Vec<ProcessNode>,
    pub(crate) index: HashMap<ProcessId, NodeId>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) report: BuildReport,
}

impl Forest {
    /// Assemble a forest from explicit links without any validation.
    ///
    /// `links` are `(parent, child)` pairs appended in the given order; pairs
    /// naming unknown pids are ignored. Nothing prevents cycles or shared
    /// children, which makes this useful for exercising renderer safety.
    #[doc(hidden)]
    pub fn from_links_unchecked(
        records: Vec<ProcessRecord>,
        links: &[(u32, u32)],
        roots: &[u32],
    ) -> Self {
        let mut forest = Forest::default();
        for record in records {
            let id = NodeId(forest.nodes.len());
            forest.index.insert(record.pid, id);
            forest.nodes.push(ProcessNode {
                record,
                children: Vec::new(),
            });
        }
        for &(parent, child) in links {
            if let (Some(p), Some(c)) = (
                forest.index.get(&ProcessId(parent)).copied(),
                forest.index.get(&ProcessId(child)).copied(),
            ) {
                forest.nodes[p.0].children.push(c);
            }
        }
        forest.roots = roots
            .iter()
            .filter_map(|pid| forest.index.get(&ProcessId(*pid)).copied())
            .collect();
        forest.report.records = forest.nodes.len();
        forest
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root nodes in ascending pid order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &ProcessNode {
        &self.nodes[id.0]
    }

    /// O(1) pid lookup.
    pub fn find(&self, pid: ProcessId) -> Option<NodeId> {
        self.index.get(&pid).copied()
    }

    pub fn get(&self, pid: ProcessId) -> Option<&ProcessNode> {
        self.find(pid).map(|id| self.node(id))
    }

    /// All nodes in ascending pid order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ProcessNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Pre-order walk from the roots, each node visited at most once.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }
}
