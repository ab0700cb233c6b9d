//! Lazy line-by-line tree traversal.
//!
//! [`TreeLines`] walks pre-order with an explicit stack, so arbitrarily deep
//! chains do not grow the call stack. A pid is emitted at most once per
//! traversal; a repeat (only possible in a malformed forest) is skipped
//! together with its subtree.

use super::format::{format_memory, format_uptime, truncate_cmdline};
use super::style::{self, Thresholds};
use crate::tree::{Forest, NodeId};
use pt_common::ProcessId;
use std::collections::HashSet;

const TEE: &str = "├── ";
const ELBOW: &str = "└── ";
const PIPE: &str = "│   ";
const GAP: &str = "    ";
const DETAIL: &str = "└─ ";

/// Per-invocation display switches.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Append CPU and memory.
    pub resources: bool,
    /// Append user, threads, uptime, and a command-line detail line.
    pub verbose: bool,
    /// Maximum command-line characters before `...`.
    pub cmdline_width: usize,
    pub thresholds: Thresholds,
    /// Reference time for uptimes (Unix seconds).
    pub now: i64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resources: false,
            verbose: false,
            cmdline_width: 80,
            thresholds: Thresholds::default(),
            now: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `name [PID: n]` plus annotations.
    Primary,
    /// Verbose command-line line under a primary line.
    Detail,
}

/// A run of text with an optional ANSI style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Option<&'static str>,
}

/// One rendered line. Plain and styled forms carry the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub pid: ProcessId,
    /// 0 for the node a traversal started from.
    pub depth: usize,
    pub kind: LineKind,
    spans: Vec<Span>,
}

impl TreeLine {
    fn push(&mut self, text: impl Into<String>, style: Option<&'static str>) {
        let text = text.into();
        if !text.is_empty() {
            self.spans.push(Span { text, style });
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Whether this line starts a top-level subtree.
    pub fn is_top_level(&self) -> bool {
        self.depth == 0 && self.kind == LineKind::Primary
    }

    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn styled(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            match span.style {
                Some(code) => {
                    out.push_str(code);
                    out.push_str(&span.text);
                    out.push_str(style::RESET);
                }
                None => out.push_str(&span.text),
            }
        }
        out
    }

    pub fn render(&self, color: bool) -> String {
        if color {
            self.styled()
        } else {
            self.plain()
        }
    }
}

impl std::fmt::Display for TreeLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Middle,
    Last,
}

impl Position {
    fn of(index: usize, len: usize) -> Self {
        if index + 1 == len {
            Position::Last
        } else {
            Position::Middle
        }
    }
}

#[derive(Debug)]
struct Frame {
    id: NodeId,
    depth: usize,
    /// Segments contributed by ancestors.
    prefix: String,
    position: Position,
}

/// Iterator over the display lines of one traversal.
pub struct TreeLines<'a> {
    forest: &'a Forest,
    options: &'a RenderOptions,
    starts: std::iter::Peekable<std::vec::IntoIter<NodeId>>,
    stack: Vec<Frame>,
    rendered: HashSet<ProcessId>,
    pending: Option<TreeLine>,
}

impl<'a> TreeLines<'a> {
    /// Traverse from `starts` in order, sharing one rendered-pid set.
    pub fn new(forest: &'a Forest, starts: Vec<NodeId>, options: &'a RenderOptions) -> Self {
        Self {
            forest,
            options,
            starts: starts.into_iter().peekable(),
            stack: Vec::new(),
            rendered: HashSet::new(),
            pending: None,
        }
    }

    fn primary_line(&self, frame: &Frame) -> TreeLine {
        let record = &self.forest.node(frame.id).record;
        let opts = self.options;

        let connector = match frame.position {
            Position::Middle => TEE,
            Position::Last => ELBOW,
        };

        let mut line = TreeLine {
            pid: record.pid,
            depth: frame.depth,
            kind: LineKind::Primary,
            spans: Vec::new(),
        };
        line.push(format!("{}{}", frame.prefix, connector), None);
        line.push(record.name.as_str(), Some(style::status_style(record.status)));
        line.push(" ", None);
        line.push(format!("[PID: {}]", record.pid), Some(style::YELLOW));

        if opts.resources {
            let cpu = record.cpu();
            let rss = record.rss();
            line.push(" ", None);
            line.push(
                format!("CPU: {:.1}%", cpu),
                Some(style::cpu_style(style::cpu_tier(cpu, &opts.thresholds))),
            );
            line.push(" ", None);
            line.push(
                format!("MEM: {}", format_memory(rss)),
                Some(style::memory_style(style::memory_tier(rss, &opts.thresholds))),
            );
        }

        if opts.verbose {
            let uptime = format_uptime(record.start_time.value().copied(), opts.now);
            line.push(" ", None);
            line.push(format!("User: {}", record.owner()), Some(style::MAGENTA));
            line.push(" ", None);
            line.push(format!("Threads: {}", record.thread_count()), Some(style::BLUE));
            line.push(" ", None);
            line.push(format!("Uptime: {}", uptime), Some(style::CYAN));
        }

        line
    }

    fn detail_line(&self, frame: &Frame, child_prefix: &str) -> Option<TreeLine> {
        let record = &self.forest.node(frame.id).record;
        if !self.options.verbose || record.cmdline.is_empty() || record.cmdline == record.name {
            return None;
        }
        let mut line = TreeLine {
            pid: record.pid,
            depth: frame.depth,
            kind: LineKind::Detail,
            spans: Vec::new(),
        };
        line.push(child_prefix, None);
        line.push(
            format!(
                "{}{}",
                DETAIL,
                truncate_cmdline(&record.cmdline, self.options.cmdline_width)
            ),
            Some(style::DIM_WHITE),
        );
        Some(line)
    }
}

impl Iterator for TreeLines<'_> {
    type Item = TreeLine;

    fn next(&mut self) -> Option<TreeLine> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }

        let forest = self.forest;
        loop {
            // Traversal starts form one sibling group with an empty prefix
            let frame = match self.stack.pop() {
                Some(frame) => frame,
                None => {
                    let id = self.starts.next()?;
                    Frame {
                        id,
                        depth: 0,
                        prefix: String::new(),
                        position: if self.starts.peek().is_some() {
                            Position::Middle
                        } else {
                            Position::Last
                        },
                    }
                }
            };

            let node = forest.node(frame.id);
            if !self.rendered.insert(node.pid()) {
                continue;
            }

            let child_prefix = match frame.position {
                Position::Middle => format!("{}{}", frame.prefix, PIPE),
                Position::Last => format!("{}{}", frame.prefix, GAP),
            };

            let children = node.children();
            for (i, child) in children.iter().enumerate().rev() {
                self.stack.push(Frame {
                    id: *child,
                    depth: frame.depth + 1,
                    prefix: child_prefix.clone(),
                    position: Position::of(i, children.len()),
                });
            }

            self.pending = self.detail_line(&frame, &child_prefix);
            return Some(self.primary_line(&frame));
        }
    }
}
