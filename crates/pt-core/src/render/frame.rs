//! One complete page of output: summary, header, trees, statistics.
//!
//! Shared by single-shot output, each monitor cycle, and file export.

use super::lines::{RenderOptions, TreeLines};
use super::summary;
use super::{select, RenderMode, Selection};
use crate::collect::Snapshot;
use crate::tree::{Forest, ForestStats};
use std::io::{self, Write};

/// What to put on the page.
#[derive(Debug, Clone)]
pub struct FrameRequest<'a> {
    pub mode: &'a RenderMode,
    pub options: &'a RenderOptions,
    /// Title block with timestamp and process count.
    pub header: bool,
    /// `Collected N processes` line before the header.
    pub collection_summary: bool,
    /// Statistics block after the trees.
    pub stats: bool,
    pub color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered { lines: usize },
    NotFound,
    /// `stop` returned true at a top-level boundary.
    Interrupted,
}

/// Write one page to `out`.
///
/// `stop` is consulted before each top-level subtree; lines already started
/// are always completed.
pub fn write_frame<W, F>(
    out: &mut W,
    snapshot: &Snapshot,
    forest: &Forest,
    request: &FrameRequest<'_>,
    stop: F,
) -> io::Result<FrameOutcome>
where
    W: Write,
    F: Fn() -> bool,
{
    let color = request.color;

    if request.collection_summary {
        writeln!(
            out,
            "{}",
            summary::collection_line(snapshot.records.len(), &snapshot.metadata, color)
        )?;
    }
    if request.header {
        for line in summary::header_lines(forest.len(), snapshot.metadata.captured_at, color) {
            writeln!(out, "{}", line)?;
        }
    }

    let selection = select(forest, request.mode);
    let outcome = match &selection {
        Selection::NotFound => FrameOutcome::NotFound,
        Selection::Found(traversals) => {
            if matches!(request.mode, RenderMode::Search(_)) {
                for line in summary::found_banner(traversals.len(), color) {
                    writeln!(out, "{}", line)?;
                }
            }

            let mut written = 0;
            let mut interrupted = false;
            'traversals: for starts in traversals {
                if !matches!(request.mode, RenderMode::Full) {
                    if let Some(first) = starts.first() {
                        for line in summary::subtree_banner(&forest.node(*first).record.name, color)
                        {
                            writeln!(out, "{}", line)?;
                        }
                    }
                }
                for line in TreeLines::new(forest, starts.clone(), request.options) {
                    if line.is_top_level() && stop() {
                        interrupted = true;
                        break 'traversals;
                    }
                    writeln!(out, "{}", line.render(color))?;
                    written += 1;
                }
            }

            if interrupted {
                out.flush()?;
                return Ok(FrameOutcome::Interrupted);
            }
            FrameOutcome::Rendered { lines: written }
        }
    };

    if request.stats {
        for line in summary::stats_lines(&ForestStats::compute(forest), color) {
            writeln!(out, "{}", line)?;
        }
    }

    out.flush()?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{collect_snapshot, MemorySource, ProcessRecord, SnapshotOptions};
    use crate::tree::{build_forest, Query};
    use pt_common::ProcessId;
    use std::cell::Cell;

    fn snapshot() -> Snapshot {
        let source = MemorySource::new(vec![
            ProcessRecord::new(1, 0, "init"),
            ProcessRecord::new(10, 1, "shell"),
            ProcessRecord::new(20, 10, "editor"),
            ProcessRecord::new(99, 5000, "orphan"),
        ]);
        collect_snapshot(&source, &SnapshotOptions::default()).unwrap()
    }

    fn request<'a>(mode: &'a RenderMode, options: &'a RenderOptions) -> FrameRequest<'a> {
        FrameRequest {
            mode,
            options,
            header: false,
            collection_summary: false,
            stats: false,
            color: false,
        }
    }

    fn run(req: &FrameRequest<'_>) -> (String, FrameOutcome) {
        let snap = snapshot();
        let forest = build_forest(snap.records.clone());
        let mut buf = Vec::new();
        let outcome = write_frame(&mut buf, &snap, &forest, req, || false).unwrap();
        (String::from_utf8(buf).unwrap(), outcome)
    }

    #[test]
    fn test_full_frame_bare() {
        let options = RenderOptions::default();
        let (text, outcome) = run(&request(&RenderMode::Full, &options));
        assert_eq!(
            text,
            "├── init [PID: 1]\n│   └── shell [PID: 10]\n│       └── editor [PID: 20]\n└── orphan [PID: 99]\n"
        );
        assert_eq!(outcome, FrameOutcome::Rendered { lines: 4 });
    }

    #[test]
    fn test_subtree_banner() {
        let options = RenderOptions::default();
        let mode = RenderMode::Subtree(ProcessId(10));
        let (text, _) = run(&request(&mode, &options));
        assert!(text.starts_with("\nProcess Subtree for: shell\n"));
        assert!(text.ends_with("\n└── shell [PID: 10]\n    └── editor [PID: 20]\n"));
    }

    #[test]
    fn test_search_not_found_still_prints_stats() {
        let options = RenderOptions::default();
        let mode = RenderMode::Search(Query::parse("nothing-here"));
        let mut req = request(&mode, &options);
        req.stats = true;
        let (text, outcome) = run(&req);
        assert_eq!(outcome, FrameOutcome::NotFound);
        assert!(text.contains("Process Statistics:"));
        assert!(!text.contains("Found"));
    }

    #[test]
    fn test_search_banner_counts_matches() {
        let options = RenderOptions::default();
        let mode = RenderMode::Search(Query::parse("i"));
        let (text, outcome) = run(&request(&mode, &options));
        // init (with its subtree) and editor
        assert!(text.starts_with("Found 2 matching process(es):\n"));
        assert_eq!(outcome, FrameOutcome::Rendered { lines: 4 });
    }

    #[test]
    fn test_header_and_collection_summary() {
        let options = RenderOptions::default();
        let mut req = request(&RenderMode::Full, &options);
        req.header = true;
        req.collection_summary = true;
        let (text, _) = run(&req);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Collected 4 processes"));
        assert_eq!(lines.next().map(|l| l.chars().count()), Some(70));
        assert_eq!(lines.next(), Some("Process Tree Visualizer"));
    }

    #[test]
    fn test_stop_between_roots() {
        let snap = snapshot();
        let forest = build_forest(snap.records.clone());
        let options = RenderOptions::default();
        let req = request(&RenderMode::Full, &options);
        let roots_seen = Cell::new(0);
        let mut buf = Vec::new();
        let outcome = write_frame(&mut buf, &snap, &forest, &req, || {
            roots_seen.set(roots_seen.get() + 1);
            roots_seen.get() > 1
        })
        .unwrap();

        assert_eq!(outcome, FrameOutcome::Interrupted);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "├── init [PID: 1]\n│   └── shell [PID: 10]\n│       └── editor [PID: 20]\n"
        );
    }
}
