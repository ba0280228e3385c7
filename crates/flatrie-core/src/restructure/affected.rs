//! Locating the single storage entry a plain insertion would modify

use super::peek::would_be_parent;
use crate::node::StoredNode;
use crate::path::Path;
use crate::storage::lower_bound;

/// Index of the storage entry whose subtree boundary changes when a leaf at
/// `path` is inserted.
///
/// An existing leaf at `path` is its own affected node (a pure update). The
/// root is affected when the leaf sorts first. Otherwise the answer is the
/// branch at the leaf's would-be parent path or, when no branch exists there
/// yet, the top of the subtree the new leaf forks off from.
pub fn find_affected_node(path: &Path, nodes: &[StoredNode]) -> Option<usize> {
    match nodes.len() {
        0 => return None,
        1 => return Some(0),
        _ => {}
    }

    let insertion = lower_bound(nodes, path);
    if nodes.get(insertion).is_some_and(|node| node.path() == path) {
        return Some(insertion);
    }
    if insertion == 0 {
        return Some(0);
    }

    let parent = would_be_parent(path, insertion, nodes);
    Some(lower_bound(&nodes[..insertion], &parent))
}
