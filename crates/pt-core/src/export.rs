//! File and JSON sinks.
//!
//! - Snapshot files: the flat record table plus collection metadata, saved
//!   with `--save-snapshot` and replayed with `--replay`
//! - Text export: header and full tree, written without escape codes
//! - Forest document: nested JSON for `--format json`

use crate::collect::{MemorySource, ProcessRecord, Snapshot, SnapshotMetadata};
use crate::render::{
    select, write_frame, FrameOutcome, FrameRequest, RenderMode, RenderOptions, Selection,
};
use crate::tree::{BuildReport, Forest, ForestStats, NodeId};
use pt_common::ProcessId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Version written into snapshot files.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid snapshot JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: snapshot format version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl From<ExportError> for pt_common::Error {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Create { source, .. } | ExportError::Write { source, .. } => {
                pt_common::Error::Io(source)
            }
            other => pt_common::Error::Snapshot(other.to_string()),
        }
    }
}

/// On-disk form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub format_version: u32,
    pub metadata: SnapshotMetadata,
    pub records: Vec<ProcessRecord>,
}

impl From<&Snapshot> for SnapshotFile {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            metadata: snapshot.metadata.clone(),
            records: snapshot.records.clone(),
        }
    }
}

/// Replays the saved records with the original capture time, so uptimes
/// render the same as when the snapshot was taken.
impl From<SnapshotFile> for MemorySource {
    fn from(file: SnapshotFile) -> Self {
        MemorySource::new(file.records).with_capture_time(file.metadata.captured_at)
    }
}

/// Write `snapshot` as pretty JSON.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &SnapshotFile::from(snapshot))
        .map_err(io::Error::from)
        .and_then(|()| writeln!(writer))
        .and_then(|()| writer.flush())
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), records = snapshot.records.len(), "Snapshot saved");
    Ok(())
}

/// Read a snapshot file written by [`save_snapshot`].
pub fn load_snapshot(path: &Path) -> Result<SnapshotFile, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: SnapshotFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if parsed.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(ExportError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: parsed.format_version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }

    debug!(path = %path.display(), records = parsed.records.len(), "Snapshot loaded");
    Ok(parsed)
}

/// Write the header and the full tree to `path` without escape codes.
pub fn export_text(
    path: &Path,
    snapshot: &Snapshot,
    forest: &Forest,
    options: &RenderOptions,
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let request = FrameRequest {
        mode: &RenderMode::Full,
        options,
        header: true,
        collection_summary: false,
        stats: false,
        color: false,
    };
    let outcome =
        write_frame(&mut writer, snapshot, forest, &request, || false).map_err(|source| {
            ExportError::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;

    if let FrameOutcome::Rendered { lines } = outcome {
        info!(path = %path.display(), lines, "Tree exported");
    }
    Ok(())
}

/// A record and its children, nested.
#[derive(Debug, Serialize)]
pub struct JsonNode<'a> {
    #[serde(flatten)]
    pub record: &'a ProcessRecord,
    pub children: Vec<JsonNode<'a>>,
}

/// Everything `--format json` prints.
#[derive(Debug, Serialize)]
pub struct ForestDocument<'a> {
    pub mode: String,
    pub metadata: &'a SnapshotMetadata,
    pub report: &'a BuildReport,
    pub stats: ForestStats,
    /// One entry per rendered subtree; empty when nothing matched.
    pub trees: Vec<JsonNode<'a>>,
}

impl<'a> ForestDocument<'a> {
    pub fn new(snapshot: &'a Snapshot, forest: &'a Forest, mode: &RenderMode) -> Self {
        let trees = match select(forest, mode) {
            Selection::NotFound => Vec::new(),
            Selection::Found(traversals) => traversals
                .into_iter()
                .flat_map(|starts| nest_traversal(forest, &starts))
                .collect(),
        };
        Self {
            mode: mode_label(mode),
            metadata: &snapshot.metadata,
            report: forest.report(),
            stats: ForestStats::compute(forest),
            trees,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn mode_label(mode: &RenderMode) -> String {
    match mode {
        RenderMode::Full => "full".to_string(),
        RenderMode::Subtree(pid) => format!("pid:{}", pid),
        RenderMode::Search(query) => format!("search:{}", query),
    }
}

/// Nest one traversal; a pid appears at most once across its trees.
fn nest_traversal<'a>(forest: &'a Forest, starts: &[NodeId]) -> Vec<JsonNode<'a>> {
    let mut seen: HashSet<ProcessId> = HashSet::new();
    starts
        .iter()
        .filter_map(|&start| nest_from(forest, start, &mut seen))
        .collect()
}

/// Post-order assembly with an explicit stack.
fn nest_from<'a>(
    forest: &'a Forest,
    start: NodeId,
    seen: &mut HashSet<ProcessId>,
) -> Option<JsonNode<'a>> {
    if !seen.insert(forest.node(start).pid()) {
        return None;
    }

    // (node, next child index, finished children)
    let mut stack: Vec<(NodeId, usize, Vec<JsonNode<'a>>)> = vec![(start, 0, Vec::new())];
    loop {
        let (id, next) = match stack.last() {
            Some((id, next, _)) => (*id, *next),
            None => return None,
        };
        let children = forest.node(id).children();

        if next < children.len() {
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            let child = children[next];
            if seen.insert(forest.node(child).pid()) {
                stack.push((child, 0, Vec::new()));
            }
            continue;
        }

        let (id, _, finished) = stack.pop()?;
        let node = JsonNode {
            record: &forest.node(id).record,
            children: finished,
        };
        match stack.last_mut() {
            Some(parent) => parent.2.push(node),
            None => return Some(node),
        }
    }
}
