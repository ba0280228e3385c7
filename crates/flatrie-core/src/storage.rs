//! The committed node array
//!
//! Nodes are kept sorted ascending by path, which for a Patricia trie is the
//! preorder traversal: a branch sits immediately before its own subtree and
//! every subtree occupies a contiguous run. Nothing stores a parent or child
//! link; structure is recovered by binary search over paths.

use crate::error::{Result, TrieError};
use crate::node::{Branch, Leaf, StoredNode, WorkItem};
use crate::path::{common_prefix_len, Path};
use crate::restructure::{apply_with, Update, UpdateConfig};
use serde::Serialize;
use std::ops::Range;
use tracing::{debug, instrument};

/// Index of the first node whose path is not less than `path`.
pub(crate) fn lower_bound(nodes: &[StoredNode], path: &[u8]) -> usize {
    nodes.partition_point(|node| node.path().as_bytes() < path)
}

/// One past the last index of the subtree rooted at `index`.
pub(crate) fn subtree_end(nodes: &[StoredNode], index: usize) -> usize {
    match &nodes[index] {
        StoredNode::Leaf(_) => index + 1,
        StoredNode::Branch(branch) => {
            let prefix = &branch.path;
            let rest = &nodes[index + 1..];
            index + 1 + rest.partition_point(|node| prefix.is_prefix_of(node.path()))
        }
    }
}

/// Index of the child subtree at `position` of the branch at `parent`.
pub(crate) fn child_index(nodes: &[StoredNode], parent: usize, position: usize) -> Result<usize> {
    let branch = nodes[parent]
        .as_branch()
        .ok_or_else(|| TrieError::MissingParent {
            path: nodes[parent].path().clone(),
            index: parent,
        })?;
    let prefix = branch.child_prefix(position).ok_or_else(|| {
        TrieError::structural(&branch.path, format!("no child at position {}", position))
    })?;
    let index = parent + lower_bound(&nodes[parent..], &prefix);
    match nodes.get(index) {
        Some(node) if prefix.is_prefix_of(node.path()) => Ok(index),
        _ => Err(TrieError::structural(
            &branch.path,
            format!("declared child {} has no subtree", prefix),
        )),
    }
}

/// Check the full preorder invariant in one pass.
pub fn validate(nodes: &[StoredNode]) -> Result<()> {
    // Branches whose subtree is still open, with the number of children seen.
    let mut open: Vec<(&Branch, usize)> = Vec::new();

    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            let previous = nodes[index - 1].path();
            if previous >= node.path() {
                return Err(TrieError::UnsortedInput {
                    first: previous.clone(),
                    second: node.path().clone(),
                });
            }
        }

        while let Some((branch, _)) = open.last() {
            if branch.path.is_prefix_of(node.path()) {
                break;
            }
            if let Some(entry) = open.pop() {
                close_branch(entry)?;
            }
        }

        match open.last_mut() {
            Some((branch, seen)) => {
                let symbol = node.path()[branch.path.len()];
                if branch.children.get(*seen) != Some(&symbol) {
                    return Err(TrieError::structural(
                        &branch.path,
                        format!("unexpected child {}", node.path()),
                    ));
                }
                *seen += 1;
            }
            None if index > 0 => {
                return Err(TrieError::MissingParent {
                    path: crate::restructure::parent_path(index, nodes),
                    index,
                });
            }
            None => {}
        }

        if let StoredNode::Branch(branch) = node {
            if branch.children.len() < 2 {
                return Err(TrieError::structural(
                    &branch.path,
                    "branch with fewer than two children",
                ));
            }
            if !branch.children.windows(2).all(|pair| pair[0] < pair[1]) {
                return Err(TrieError::structural(
                    &branch.path,
                    "child symbols are not strictly ascending",
                ));
            }
            open.push((branch, 0));
        }
    }

    while let Some(entry) = open.pop() {
        close_branch(entry)?;
    }
    Ok(())
}

fn close_branch((branch, seen): (&Branch, usize)) -> Result<()> {
    if seen != branch.children.len() {
        return Err(TrieError::structural(
            &branch.path,
            format!(
                "branch declares {} children but {} follow it",
                branch.children.len(),
                seen
            ),
        ));
    }
    Ok(())
}

/// A committed trie held as a preorder-sorted node array
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Storage {
    nodes: Vec<StoredNode>,
}

impl Storage {
    /// Create an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing node array after validating it
    pub fn from_nodes(nodes: Vec<StoredNode>) -> Result<Self> {
        validate(&nodes)?;
        Ok(Self { nodes })
    }

    /// Bulk-build a trie from leaves in any order
    pub fn from_leaves(leaves: impl IntoIterator<Item = Leaf>) -> Result<Self> {
        let mut leaves: Vec<Leaf> = leaves.into_iter().collect();
        leaves.sort_by(|a, b| a.path.cmp(&b.path));
        if let Some(pair) = leaves.windows(2).find(|pair| pair[0].path == pair[1].path) {
            return Err(TrieError::DuplicateWorkPath(pair[0].path.clone()));
        }

        let mut nodes = Vec::with_capacity(leaves.len() * 2);
        build_subtree(&leaves, &mut nodes)?;
        Ok(Self { nodes })
    }

    /// All nodes in path order
    pub fn nodes(&self) -> &[StoredNode] {
        &self.nodes
    }

    /// Consume into the raw node array
    pub fn into_nodes(self) -> Vec<StoredNode> {
        self.nodes
    }

    /// Number of nodes (branches and leaves)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the trie is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a committed leaf by path
    pub fn get(&self, path: &Path) -> Option<&Leaf> {
        let index = lower_bound(&self.nodes, path);
        self.nodes
            .get(index)
            .and_then(StoredNode::as_leaf)
            .filter(|leaf| &leaf.path == path)
    }

    /// Iterate committed leaves in path order
    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.nodes.iter().filter_map(StoredNode::as_leaf)
    }

    /// One past the last index of the subtree rooted at `index`
    pub fn subtree_end(&self, index: usize) -> Option<usize> {
        (index < self.nodes.len()).then(|| subtree_end(&self.nodes, index))
    }

    /// Indices of the child subtrees of the branch at `index`
    pub fn children(&self, index: usize) -> Result<Vec<usize>> {
        let node = self.nodes.get(index).ok_or(TrieError::IndexOutOfRange {
            index,
            len: self.nodes.len(),
        })?;
        let count = node.as_branch().map_or(0, |branch| branch.children.len());
        (0..count)
            .map(|position| child_index(&self.nodes, index, position))
            .collect()
    }

    /// Re-run the full invariant check
    pub fn validate(&self) -> Result<()> {
        validate(&self.nodes)
    }

    /// Replace `update.range` with `update.replacement`
    pub fn splice(&mut self, update: &Update) {
        self.nodes
            .splice(update.range.clone(), update.replacement.iter().cloned());
    }

    /// Apply one batch with the default configuration
    pub fn apply_batch(&mut self, work: &[WorkItem]) -> Result<Update> {
        self.apply_batch_with(work, &UpdateConfig::default())
    }

    /// Apply one batch and splice the result in place
    #[instrument(skip_all, fields(nodes = self.nodes.len(), work = work.len()))]
    pub fn apply_batch_with(&mut self, work: &[WorkItem], config: &UpdateConfig) -> Result<Update> {
        let update = apply_with(&self.nodes, work, config)?;
        self.splice(&update);
        debug!(
            start = update.range.start,
            end = update.range.end,
            inserted = update.replacement.len(),
            total = self.nodes.len(),
            "spliced batch"
        );
        Ok(update)
    }

    /// Range of node indices whose paths start with `prefix`
    pub fn prefix_range(&self, prefix: &Path) -> Range<usize> {
        let start = lower_bound(&self.nodes, prefix);
        let len = self.nodes[start..].partition_point(|node| prefix.is_prefix_of(node.path()));
        start..start + len
    }
}

/// Emit the preorder array for a sorted, duplicate-free run of leaves.
fn build_subtree(leaves: &[Leaf], out: &mut Vec<StoredNode>) -> Result<()> {
    let (first, last) = match leaves {
        [] => return Ok(()),
        [leaf] => {
            out.push(StoredNode::Leaf(leaf.clone()));
            return Ok(());
        }
        [first, .., last] => (first, last),
    };

    // For a sorted run the shared prefix of the ends is shared by all.
    let depth = common_prefix_len(&first.path, &last.path);
    if first.path.len() == depth {
        return Err(TrieError::structural(
            &first.path,
            "leaf path is a prefix of another leaf",
        ));
    }

    let mut groups: Vec<Range<usize>> = Vec::new();
    let mut start = 0;
    for index in 1..leaves.len() {
        if leaves[index].path[depth] != leaves[start].path[depth] {
            groups.push(start..index);
            start = index;
        }
    }
    groups.push(start..leaves.len());

    let children = groups
        .iter()
        .map(|group| leaves[group.start].path[depth])
        .collect::<Vec<u8>>();
    out.push(StoredNode::branch(first.path.truncated(depth), children));

    for group in groups {
        build_subtree(&leaves[group], out)?;
    }
    Ok(())
}
