//! Batch application: window, reduction to a single root, minimal splice

use super::peek::Position;
use super::transform::{apply_merge, transform, Subtree};
use super::window::{Traversal, Window};
use crate::error::{Result, TrieError};
use crate::node::{StoredNode, WorkItem};
use crate::path::Path;
use crate::storage::{subtree_end, validate};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, instrument, trace};

/// Configuration for applying a batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// How the window is walked
    #[serde(default)]
    pub traversal: Traversal,
    /// Validate the whole node array before touching it
    #[serde(default = "default_verify")]
    pub verify_storage: bool,
}

fn default_verify() -> bool {
    true
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            traversal: Traversal::Forward,
            verify_storage: true,
        }
    }
}

impl UpdateConfig {
    /// Build the window right to left
    pub fn backward(mut self) -> Self {
        self.traversal = Traversal::Backward;
        self
    }

    /// Skip the up-front array validation
    pub fn unverified(mut self) -> Self {
        self.verify_storage = false;
        self
    }
}

/// Splicing `replacement` over `range` of the old array yields the new one
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub range: Range<usize>,
    pub replacement: Vec<StoredNode>,
}

impl Update {
    /// Check if the batch left the array unchanged
    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.replacement.is_empty()
    }

    /// Apply to an owned array
    pub fn splice_into(&self, nodes: &mut Vec<StoredNode>) {
        nodes.splice(self.range.clone(), self.replacement.iter().cloned());
    }
}

/// Apply a batch with the default configuration
pub fn apply(nodes: &[StoredNode], work: &[WorkItem]) -> Result<Update> {
    apply_with(nodes, work, &UpdateConfig::default())
}

/// Compute the replacement a sorted batch makes to a node array.
#[instrument(skip_all, fields(nodes = nodes.len(), work = work.len(), traversal = ?config.traversal))]
pub fn apply_with(nodes: &[StoredNode], work: &[WorkItem], config: &UpdateConfig) -> Result<Update> {
    if config.verify_storage {
        validate(nodes)?;
    }

    let window = Window::build_with(work, nodes, config.traversal)?;
    debug!(window = window.len(), "built transformation window");

    let root = reduce(&window, work, nodes)?;
    let mut segments = Vec::new();
    if let Some(root) = &root {
        flatten(root, nodes, &mut segments)?;
    }

    let update = trim(segments, nodes);
    debug!(
        start = update.range.start,
        end = update.range.end,
        replacement = update.replacement.len(),
        "computed update"
    );
    Ok(update)
}

/// Fuse the window into a single subtree, or `None` when nothing is left.
///
/// Shift-reduce over the window: the top two stacked elements are offered to
/// [`transform`] with the element below them and the next unread one as
/// context. A merge keeps the common prefix the fused element shares with
/// both outer neighbors, so a pair rejected once stays rejected and only the
/// top of the stack needs rechecking.
pub fn reduce<'a>(
    window: &Window,
    work: &'a [WorkItem],
    nodes: &'a [StoredNode],
) -> Result<Option<Subtree<'a>>> {
    let mut input = window
        .positions()
        .iter()
        .map(|position| match *position {
            Position::Storage(index) => Subtree::Stored {
                index,
                node: &nodes[index],
            },
            Position::Work(index) => Subtree::Pending {
                index,
                item: &work[index],
            },
        })
        .peekable();
    let mut stack: Vec<Subtree<'a>> = Vec::with_capacity(window.len());
    let mut merges = 0usize;

    loop {
        while stack.len() >= 2 {
            let n = stack.len();
            let s1 = n.checked_sub(3).map(|i| &stack[i]);
            let decision = transform(s1, &stack[n - 2], &stack[n - 1], input.peek())?;
            let Some(merge) = decision else {
                break;
            };
            let (Some(s3), Some(s2)) = (stack.pop(), stack.pop()) else {
                break;
            };
            trace!(left = %s2.path(), right = %s3.path(), ?merge, "merge");
            stack.push(apply_merge(merge, s2, s3, nodes)?);
            merges += 1;
        }
        match input.next() {
            Some(next) => stack.push(next),
            None => break,
        }
    }

    debug!(merges, "reduced window");
    match stack.len() {
        0 | 1 => Ok(stack.pop()),
        _ => Err(TrieError::structural(
            stack[stack.len() - 2].path(),
            format!("window did not reduce to one root, {} elements left", stack.len()),
        )),
    }
}

/// A run of the output array
#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    /// Unchanged storage range
    Copy(Range<usize>),
    /// Newly built node
    Node(StoredNode),
}

fn flatten(subtree: &Subtree<'_>, nodes: &[StoredNode], out: &mut Vec<Segment>) -> Result<()> {
    match subtree {
        Subtree::Stored { index, .. } => out.push(Segment::Copy(*index..subtree_end(nodes, *index))),
        Subtree::Pending { item, .. } => {
            let leaf = item
                .to_leaf()
                .ok_or_else(|| TrieError::structural(&item.path, "deleted leaf left in window"))?;
            out.push(Segment::Node(leaf.into()));
        }
        Subtree::Fork { path, children } => {
            let symbols = children
                .iter()
                .map(|child| child_symbol(path, child))
                .collect::<Result<Vec<u8>>>()?;
            out.push(Segment::Node(StoredNode::branch(path.clone(), symbols)));
            for child in children {
                flatten(child, nodes, out)?;
            }
        }
    }
    Ok(())
}

fn child_symbol(parent: &Path, child: &Subtree<'_>) -> Result<u8> {
    child
        .path()
        .symbol(parent.len())
        .ok_or_else(|| TrieError::structural(parent, format!("child {} is not below it", child.path())))
}

/// Drop the leading and trailing output that already matches storage.
fn trim(segments: Vec<Segment>, nodes: &[StoredNode]) -> Update {
    let mut start = 0;
    let mut end = nodes.len();
    let mut front = 0;
    let mut back = segments.len();

    while front < back {
        match &segments[front] {
            Segment::Copy(range) if range.start == start => start = range.end,
            Segment::Node(node) if nodes.get(start) == Some(node) => start += 1,
            _ => break,
        }
        front += 1;
    }
    while front < back {
        match &segments[back - 1] {
            Segment::Copy(range) if range.end == end && range.start >= start => end = range.start,
            Segment::Node(node) if end > start && nodes[end - 1] == *node => end -= 1,
            _ => break,
        }
        back -= 1;
    }

    let mut replacement = Vec::new();
    for segment in segments.into_iter().take(back).skip(front) {
        match segment {
            Segment::Copy(range) => replacement.extend_from_slice(&nodes[range]),
            Segment::Node(node) => replacement.push(node),
        }
    }
    Update {
        range: start..end,
        replacement,
    }
}
