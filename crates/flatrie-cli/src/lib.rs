//! # Flatrie CLI
//!
//! File-based driver for the flat trie core. Node arrays, leaves and work
//! batches are read as JSON; results are written back as JSON.
//!
//! ## Formats
//!
//! ```text
//! nodes   [{"kind":"branch","path":"45","children":"12"},
//!          {"kind":"leaf","path":"4511","value":"0a"}, ...]
//! leaves  [{"path":"4511","value":"0a"}, ...]
//! work    [{"path":"4501","action":"upsert","value":"ff"},
//!          {"path":"4511","action":"delete"}, ...]
//! ```

pub mod config;
pub mod error;

pub use config::CliConfig;
pub use error::{CliError, Result};

use flatrie_core::restructure::{Position, Window};
use flatrie_core::{Leaf, Storage, StoredNode, Update, WorkItem};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Result of applying one batch file
#[derive(Debug, Serialize)]
pub struct ApplyOutcome {
    /// The splice that was computed
    pub update: Update,
    /// Node array after the splice
    pub nodes: Vec<StoredNode>,
}

/// One element of a transformation window
#[derive(Debug, Serialize)]
pub struct WindowEntry {
    pub position: Position,
    pub path: flatrie_core::Path,
}

/// Shape of a node array
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub nodes: usize,
    pub branches: usize,
    pub leaves: usize,
    pub depth: usize,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a node array
pub fn load_nodes(path: &Path) -> Result<Vec<StoredNode>> {
    read_json(path)
}

/// Load a set of leaves
pub fn load_leaves(path: &Path) -> Result<Vec<Leaf>> {
    read_json(path)
}

/// Load a work batch, sorting it if configured
pub fn load_work(path: &Path, config: &CliConfig) -> Result<Vec<WorkItem>> {
    let mut work: Vec<WorkItem> = read_json(path)?;
    if config.sort_work {
        work.sort_by(|a, b| a.path.cmp(&b.path));
    }
    Ok(work)
}

/// Serialize `value` to `output`, or stdout when no path is given
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(CliError::Encode)?;

    match output {
        Some(path) => std::fs::write(path, text + "\n").map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Apply a batch file to a node array file
pub fn apply_files(config: &CliConfig, storage: &Path, work: &Path) -> Result<ApplyOutcome> {
    let mut nodes = load_nodes(storage)?;
    let work = load_work(work, config)?;
    info!(nodes = nodes.len(), work = work.len(), "applying batch");

    let update = flatrie_core::apply_with(&nodes, &work, &config.update_config())?;
    update.splice_into(&mut nodes);
    debug!(
        start = update.range.start,
        end = update.range.end,
        total = nodes.len(),
        "batch applied"
    );
    Ok(ApplyOutcome { update, nodes })
}

/// List the transformation window a batch file opens on a node array file
pub fn window_files(config: &CliConfig, storage: &Path, work: &Path) -> Result<Vec<WindowEntry>> {
    let nodes = load_nodes(storage)?;
    if config.verify_storage {
        flatrie_core::storage::validate(&nodes)?;
    }
    let work = load_work(work, config)?;
    let window = Window::build_with(&work, &nodes, config.traversal)?;

    Ok(window
        .positions()
        .iter()
        .map(|&position| WindowEntry {
            position,
            path: match position {
                Position::Storage(index) => nodes[index].path().clone(),
                Position::Work(index) => work[index].path.clone(),
            },
        })
        .collect())
}

/// Bulk-build a node array from a leaves file
pub fn build_file(leaves: &Path) -> Result<Vec<StoredNode>> {
    let leaves = load_leaves(leaves)?;
    info!(leaves = leaves.len(), "building trie");
    Ok(Storage::from_leaves(leaves)?.into_nodes())
}

/// Validate a node array file and describe its shape
pub fn validate_file(storage: &Path) -> Result<Summary> {
    let storage = Storage::from_nodes(load_nodes(storage)?)?;
    Ok(summarize(storage.nodes()))
}

/// Count nodes and measure branch nesting depth
pub fn summarize(nodes: &[StoredNode]) -> Summary {
    let mut summary = Summary {
        nodes: nodes.len(),
        ..Summary::default()
    };
    let mut open: Vec<&flatrie_core::Path> = Vec::new();
    for node in nodes {
        while open.last().is_some_and(|top| !top.is_prefix_of(node.path())) {
            open.pop();
        }
        summary.depth = summary.depth.max(open.len());
        match node {
            StoredNode::Branch(branch) => {
                summary.branches += 1;
                open.push(&branch.path);
            }
            StoredNode::Leaf(_) => summary.leaves += 1,
        }
    }
    summary
}
