//! Forest construction from a flat record set.
//!
//! Two passes over an arena: index and resolve parents into a side table,
//! break cycles, then attach children. Never fails; every repair is counted
//! in the [`BuildReport`].

use super::forest::{BuildReport, Forest, NodeId, ProcessNode};
use crate::collect::ProcessRecord;
use pt_common::ProcessId;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, span, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Build a cycle-free forest from records in any order.
///
/// A duplicate pid replaces the earlier record. A parent pid that is zero,
/// the node's own pid, or not in the set makes the node a root.
pub fn build_forest<I>(records: I) -> Forest
where
    I: IntoIterator<Item = ProcessRecord>,
{
    let _span = span!(Level::DEBUG, "build_forest").entered();

    let mut report = BuildReport::default();
    let mut by_pid: BTreeMap<ProcessId, ProcessRecord> = BTreeMap::new();
    for record in records {
        report.records += 1;
        if by_pid.insert(record.pid, record).is_some() {
            report.duplicates_replaced += 1;
        }
    }

    let mut nodes: Vec<ProcessNode> = Vec::with_capacity(by_pid.len());
    let mut index: HashMap<ProcessId, NodeId> = HashMap::with_capacity(by_pid.len());
    for (pid, record) in by_pid {
        index.insert(pid, NodeId(nodes.len()));
        nodes.push(ProcessNode {
            record,
            children: Vec::new(),
        });
    }

    // Pass 1: resolve declared parents into a side table
    let mut parent: Vec<Option<NodeId>> = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let rec = &node.record;
        let resolved = if rec.ppid.is_none() || rec.ppid == rec.pid {
            None
        } else {
            let found = index.get(&rec.ppid).copied();
            if found.is_none() {
                report.orphans += 1;
            }
            found
        };
        parent.push(resolved);
        if rec.is_incomplete() {
            report.incomplete += 1;
        }
    }

    report.cycles_broken = break_cycles(&mut parent);

    // Pass 2: attach. Ascending node order keeps children and roots sorted.
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => nodes[p.0].children.push(NodeId(i)),
            None => roots.push(NodeId(i)),
        }
    }

    debug!(
        records = report.records,
        nodes = nodes.len(),
        roots = roots.len(),
        duplicates = report.duplicates_replaced,
        orphans = report.orphans,
        cycles_broken = report.cycles_broken,
        incomplete = report.incomplete,
        "Forest built"
    );

    Forest {
        nodes,
        index,
        roots,
        report,
    }
}

/// Walk every ancestor chain; a chain that returns to a node still being
/// visited has that node re-rooted. Returns the number of links dropped.
fn break_cycles(parent: &mut [Option<NodeId>]) -> usize {
    let mut marks = vec![Mark::Unvisited; parent.len()];
    let mut path = Vec::new();
    let mut broken = 0;

    for start in 0..parent.len() {
        let mut cur = start;
        loop {
            match marks[cur] {
                Mark::Done => break,
                Mark::Visiting => {
                    debug!(node = cur, "Breaking parent cycle");
                    parent[cur] = None;
                    broken += 1;
                    break;
                }
                Mark::Unvisited => {
                    marks[cur] = Mark::Visiting;
                    path.push(cur);
                    match parent[cur] {
                        Some(p) => cur = p.0,
                        None => break,
                    }
                }
            }
        }
        for n in path.drain(..) {
            marks[n] = Mark::Done;
        }
    }

    broken
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pid: u32, ppid: u32) -> ProcessRecord {
        ProcessRecord::new(pid, ppid, format!("p{}", pid))
    }

    fn root_pids(forest: &Forest) -> Vec<u32> {
        forest
            .roots()
            .iter()
            .map(|id| forest.node(*id).pid().0)
            .collect()
    }

    fn child_pids(forest: &Forest, pid: u32) -> Vec<u32> {
        forest
            .get(ProcessId(pid))
            .unwrap()
            .children()
            .iter()
            .map(|id| forest.node(*id).pid().0)
            .collect()
    }

    #[test]
    fn test_basic_hierarchy() {
        let forest = build_forest(vec![rec(20, 10), rec(99, 5000), rec(1, 0), rec(10, 1)]);

        assert_eq!(root_pids(&forest), vec![1, 99]);
        assert_eq!(child_pids(&forest, 1), vec![10]);
        assert_eq!(child_pids(&forest, 10), vec![20]);
        assert_eq!(forest.report().orphans, 1);
        assert_eq!(forest.report().cycles_broken, 0);
    }

    #[test]
    fn test_children_sorted_by_pid() {
        let forest = build_forest(vec![rec(1, 0), rec(30, 1), rec(5, 1), rec(12, 1)]);
        assert_eq!(child_pids(&forest, 1), vec![5, 12, 30]);
    }

    #[test]
    fn test_two_cycle_reroots_lowest_pid() {
        let forest = build_forest(vec![rec(2, 1), rec(1, 2)]);

        assert_eq!(root_pids(&forest), vec![1]);
        assert_eq!(child_pids(&forest, 1), vec![2]);
        assert_eq!(forest.report().cycles_broken, 1);
    }

    #[test]
    fn test_self_parent_is_root() {
        let forest = build_forest(vec![rec(7, 7)]);
        assert_eq!(root_pids(&forest), vec![7]);
        assert_eq!(forest.report().cycles_broken, 0);
        assert_eq!(forest.report().orphans, 0);
    }

    #[test]
    fn test_long_cycle() {
        let n = 500;
        let records: Vec<_> = (1..=n).map(|pid| rec(pid, if pid == n { 1 } else { pid + 1 })).collect();
        let forest = build_forest(records);

        assert_eq!(forest.len(), n as usize);
        assert_eq!(forest.report().cycles_broken, 1);
        assert_eq!(forest.walk().len(), n as usize);
    }

    #[test]
    fn test_cycle_hanging_off_a_tail() {
        // 5 -> 4 -> 3 -> 4 : cycle {3,4}, 5 is a tail into it
        let forest = build_forest(vec![rec(3, 4), rec(4, 3), rec(5, 4)]);
        assert_eq!(forest.report().cycles_broken, 1);
        assert_eq!(root_pids(&forest), vec![3]);
        assert_eq!(forest.walk().len(), 3);
    }

    #[test]
    fn test_duplicate_later_wins() {
        let forest = build_forest(vec![
            rec(1, 0),
            ProcessRecord::new(5, 1, "first"),
            ProcessRecord::new(5, 1, "second"),
        ]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest.report().duplicates_replaced, 1);
        assert_eq!(forest.report().records, 3);
        assert_eq!(forest.get(ProcessId(5)).unwrap().record.name, "second");
    }

    #[test]
    fn test_incomplete_counted() {
        let mut degraded = rec(2, 1);
        degraded.rss_bytes =
            crate::collect::Sampled::Missing(crate::collect::MissingReason::AccessDenied);
        let forest = build_forest(vec![rec(1, 0), degraded]);
        assert_eq!(forest.report().incomplete, 1);
    }

    #[test]
    fn test_empty_input() {
        let forest = build_forest(Vec::new());
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
    }
}
