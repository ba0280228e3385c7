//! Parent and sibling relationships recovered from adjacency alone

use crate::error::{Result, TrieError};
use crate::node::{Branch, StoredNode};
use crate::path::{longest_common_prefix, Path};
use crate::storage::lower_bound;

/// Path of the branch enclosing the node at `index`.
///
/// The predecessor of a first child is its parent; the predecessor of any later
/// child is the last descendant of the previous sibling, and the two diverge
/// exactly at the parent's next symbol. Either way the common prefix with the
/// predecessor is the parent path. The root has the empty path as parent.
pub fn parent_path(index: usize, nodes: &[StoredNode]) -> Path {
    if index == 0 {
        return Path::empty();
    }
    longest_common_prefix(nodes[index].path(), nodes[index - 1].path())
}

/// True if both nodes hang off the same branch
pub fn are_siblings(i: usize, j: usize, nodes: &[StoredNode]) -> bool {
    parent_path(i, nodes) == parent_path(j, nodes)
}

/// True if the node at `index` is the first child of the node before it
pub fn is_first_in_branch(index: usize, nodes: &[StoredNode]) -> bool {
    index > 0 && nodes[index - 1].is_branch()
}

/// Index of the branch enclosing `index`, or `None` for the root.
pub fn find_parent_index(index: usize, nodes: &[StoredNode]) -> Result<Option<usize>> {
    if index == 0 {
        return Ok(None);
    }
    let path = parent_path(index, nodes);
    let parent = lower_bound(&nodes[..index], &path);
    match nodes.get(parent) {
        Some(StoredNode::Branch(branch)) if parent < index && branch.path == path => {
            Ok(Some(parent))
        }
        _ => Err(TrieError::MissingParent { path, index }),
    }
}

/// The enclosing branch of a non-root node together with the node's position
/// among that branch's children.
pub(crate) fn parent_of(index: usize, nodes: &[StoredNode]) -> Result<(usize, &Branch, usize)> {
    let parent = find_parent_index(index, nodes)?.ok_or_else(|| TrieError::MissingParent {
        path: Path::empty(),
        index,
    })?;
    let branch = nodes[parent]
        .as_branch()
        .ok_or_else(|| TrieError::MissingParent {
            path: nodes[parent].path().clone(),
            index,
        })?;
    let path = nodes[index].path();
    let position = path
        .symbol(branch.path.len())
        .and_then(|symbol| branch.child_position(symbol))
        .ok_or_else(|| {
            TrieError::structural(&branch.path, format!("{} is not a declared child", path))
        })?;
    Ok((parent, branch, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restructure::fixtures::ten_nodes;

    #[test]
    fn test_parent_path() {
        let nodes = ten_nodes();
        assert_eq!(parent_path(0, &nodes), Path::empty());
        assert_eq!(parent_path(1, &nodes), Path::from("0"));
        assert_eq!(parent_path(2, &nodes), Path::from("00"));
        assert_eq!(parent_path(3, &nodes), Path::from("00"));
        assert_eq!(parent_path(4, &nodes), Path::from("0"));
        assert_eq!(parent_path(8, &nodes), Path::from("0"));
    }

    #[test]
    fn test_siblings() {
        let nodes = ten_nodes();
        for (i, j) in [(1, 4), (1, 8), (1, 9), (4, 8), (8, 9), (5, 6), (6, 7)] {
            assert!(are_siblings(i, j, &nodes), "{} and {} are siblings", i, j);
        }
        for (i, j) in [(1, 2), (1, 5), (1, 7), (7, 8)] {
            assert!(!are_siblings(i, j, &nodes), "{} and {} are not siblings", i, j);
        }
        // the root is nobody's sibling
        for i in 1..nodes.len() {
            assert!(!are_siblings(0, i, &nodes));
        }
    }

    #[test]
    fn test_find_parent_index() {
        let nodes = ten_nodes();
        assert_eq!(find_parent_index(0, &nodes).unwrap(), None);
        assert_eq!(find_parent_index(1, &nodes).unwrap(), Some(0));
        assert_eq!(find_parent_index(3, &nodes).unwrap(), Some(1));
        assert_eq!(find_parent_index(7, &nodes).unwrap(), Some(4));
        assert_eq!(find_parent_index(9, &nodes).unwrap(), Some(0));
    }

    #[test]
    fn test_find_parent_index_on_corrupt_array() {
        // "00" was dropped, so the two leaves have no branch at their shared prefix
        let mut nodes = ten_nodes();
        nodes.remove(1);
        assert_eq!(
            find_parent_index(2, &nodes),
            Err(TrieError::MissingParent {
                path: Path::from("00"),
                index: 2
            })
        );
    }

    #[test]
    fn test_parent_of_reports_position() {
        let nodes = ten_nodes();
        let (parent, branch, position) = parent_of(8, &nodes).unwrap();
        assert_eq!(parent, 0);
        assert_eq!(branch.path, Path::from("0"));
        assert_eq!(position, 2);
    }
}
