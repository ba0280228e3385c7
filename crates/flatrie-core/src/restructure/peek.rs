//! Neighbor navigation over storage, or over storage interleaved with work
//!
//! Every function answers "what is the next element to the left/right at the
//! level the transformation window works on". A storage answer is the index of
//! an intact subtree; a work answer is the index of a pending leaf. Climbing
//! out of a first or last child is an iterative walk bounded by trie depth.

use super::siblings::{is_first_in_branch, parent_of};
use crate::error::{Result, TrieError};
use crate::node::{StoredNode, WorkItem};
use crate::path::{common_prefix_len, Path};
use crate::storage::{child_index, lower_bound};
use serde::{Deserialize, Serialize};

/// A position in the interleaved storage/work sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Intact subtree rooted at this storage index
    Storage(usize),
    /// Pending leaf at this work index
    Work(usize),
}

/// Left sibling of storage entry `index`, ignoring work.
///
/// A first child has no left sibling of its own, so the walk climbs to the
/// parent and continues from there.
pub fn peek_left_no_work(mut index: usize, nodes: &[StoredNode]) -> Result<Option<usize>> {
    loop {
        if index == 0 {
            return Ok(None);
        }
        if is_first_in_branch(index, nodes) {
            index -= 1;
            continue;
        }
        let (parent, branch, position) = parent_of(index, nodes)?;
        if position == 0 {
            return Err(TrieError::structural(
                &branch.path,
                format!("first child {} does not follow its branch", nodes[index].path()),
            ));
        }
        return child_index(nodes, parent, position - 1).map(Some);
    }
}

/// Right neighbor of storage entry `index`, ignoring work.
///
/// A last child climbs to its parent and takes the parent's right neighbor.
pub fn peek_right_no_work(mut index: usize, nodes: &[StoredNode]) -> Result<Option<usize>> {
    loop {
        if index == 0 || index + 1 >= nodes.len() {
            return Ok(None);
        }
        let (parent, branch, position) = parent_of(index, nodes)?;
        if position + 1 == branch.children.len() {
            index = parent;
            continue;
        }
        return child_index(nodes, parent, position + 1).map(Some);
    }
}

/// Parent path a leaf at `path` would get if inserted at `insertion`: the
/// longer of its common prefixes with the two storage neighbors, ties going to
/// the left neighbor.
pub(crate) fn would_be_parent(path: &Path, insertion: usize, nodes: &[StoredNode]) -> Path {
    let left = insertion
        .checked_sub(1)
        .map(|index| common_prefix_len(nodes[index].path(), path));
    let right = nodes
        .get(insertion)
        .map(|node| common_prefix_len(node.path(), path));
    let len = match (left, right) {
        (Some(left), Some(right)) if right > left => right,
        (Some(left), _) => left,
        (None, Some(right)) => right,
        (None, None) => 0,
    };
    path.truncated(len)
}

fn collides_with_branch(path: &Path) -> TrieError {
    TrieError::structural(path, "leaf path collides with a branch")
}

/// Nearest storage entry strictly left of a leaf at `path`, in final order.
fn left_of_leaf(path: &Path, nodes: &[StoredNode]) -> Result<Option<usize>> {
    let insertion = lower_bound(nodes, path);
    if let Some(node) = nodes.get(insertion) {
        if node.path() == path {
            if node.is_branch() {
                return Err(collides_with_branch(path));
            }
            return peek_left_no_work(insertion, nodes);
        }
    }
    if insertion == 0 {
        return Ok(None);
    }

    let parent_path = would_be_parent(path, insertion, nodes);
    let target = lower_bound(nodes, &parent_path);
    let node = nodes.get(target).ok_or_else(|| TrieError::MissingParent {
        path: parent_path.clone(),
        index: insertion,
    })?;

    // No branch at the parent path yet: the leaf forks off the subtree there.
    if node.path() != &parent_path {
        return if node.path() < path {
            Ok(Some(target))
        } else {
            peek_left_no_work(target, nodes)
        };
    }

    let branch = node
        .as_branch()
        .ok_or_else(|| TrieError::structural(node.path(), "leaf path is a prefix of another path"))?;
    let symbol = path
        .symbol(parent_path.len())
        .ok_or_else(|| collides_with_branch(path))?;
    let position = branch.children.partition_point(|&child| child < symbol);
    if branch.children.get(position) == Some(&symbol) {
        return Err(TrieError::structural(
            &branch.path,
            format!("{} falls inside an existing child", path),
        ));
    }

    if position == 0 {
        peek_left_no_work(target, nodes)
    } else if position == branch.children.len() {
        // appended after the last child, the branch itself stays intact
        Ok(Some(target))
    } else {
        child_index(nodes, target, position - 1).map(Some)
    }
}

/// Nearest storage entry strictly left of the first work item.
pub fn peek_left_from_first_work(item: &WorkItem, nodes: &[StoredNode]) -> Result<Option<usize>> {
    left_of_leaf(&item.path, nodes)
}

/// Right neighbor of `from`, interleaving storage with pending work.
///
/// `current_work` is the most recent work index visited; the next pending
/// item is `current_work + 1`.
pub fn peek_right(
    from: Position,
    current_work: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    match from {
        Position::Work(index) => peek_right_from_work(index, work, nodes),
        Position::Storage(index) => peek_right_from_node(index, current_work, work, nodes),
    }
}

/// Right neighbor of work item `index`
pub fn peek_right_from_work(
    index: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    let path = &work[index].path;
    let insertion = lower_bound(nodes, path);
    let raw = match nodes.get(insertion) {
        None => None,
        Some(node) if node.path() == path => {
            if node.is_branch() {
                return Err(collides_with_branch(path));
            }
            // the committed leaf is superseded by the work item
            peek_right_no_work(insertion, nodes)?
        }
        Some(_) => Some(insertion),
    };
    reconcile_right(raw, index, work, nodes)
}

/// Right neighbor of storage entry `index`
pub fn peek_right_from_node(
    index: usize,
    current_work: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    let raw = peek_right_no_work(index, nodes)?;
    reconcile_right(raw, current_work, work, nodes)
}

/// Merge a storage-only right neighbor with the next pending work item.
fn reconcile_right(
    raw: Option<usize>,
    current_work: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    let next = current_work + 1;
    let Some(next_item) = work.get(next) else {
        return Ok(raw.map(Position::Storage));
    };
    let Some(mut candidate) = raw else {
        return Ok(Some(Position::Work(next)));
    };

    let target = &next_item.path;
    while let StoredNode::Branch(branch) = &nodes[candidate] {
        if !branch.path.is_prefix_of(target) {
            break;
        }
        let symbol = target
            .symbol(branch.path.len())
            .ok_or_else(|| collides_with_branch(target))?;
        if branch.children.last().is_some_and(|&last| last < symbol) {
            // appended after the last child, the branch itself stays intact
            return Ok(Some(Position::Storage(candidate)));
        }
        // the item lands inside: descend to the first child
        candidate += 1;
        if candidate >= nodes.len() {
            return Err(TrieError::structural(&branch.path, "branch has no children"));
        }
    }

    if nodes[candidate].path() < target {
        Ok(Some(Position::Storage(candidate)))
    } else {
        Ok(Some(Position::Work(next)))
    }
}

/// Left neighbor of `from`, interleaving storage with pending work.
///
/// `current_work` is the most recent work index visited walking leftwards;
/// the previous pending item is `current_work - 1`.
pub fn peek_left(
    from: Position,
    current_work: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    match from {
        Position::Work(index) => peek_left_from_work(index, work, nodes),
        Position::Storage(index) => peek_left_from_node(index, current_work, work, nodes),
    }
}

/// Left neighbor of work item `index`
pub fn peek_left_from_work(
    index: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    let raw = left_of_leaf(&work[index].path, nodes)?;
    reconcile_left(raw, index, work, nodes)
}

/// Left neighbor of storage entry `index`
pub fn peek_left_from_node(
    index: usize,
    current_work: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    let raw = peek_left_no_work(index, nodes)?;
    reconcile_left(raw, current_work, work, nodes)
}

/// Merge a storage-only left neighbor with the previous pending work item.
fn reconcile_left(
    raw: Option<usize>,
    current_work: usize,
    work: &[WorkItem],
    nodes: &[StoredNode],
) -> Result<Option<Position>> {
    let Some(previous) = current_work.checked_sub(1) else {
        return Ok(raw.map(Position::Storage));
    };
    let Some(mut candidate) = raw else {
        return Ok(Some(Position::Work(previous)));
    };

    let target = &work[previous].path;
    while let StoredNode::Branch(branch) = &nodes[candidate] {
        if !branch.path.is_prefix_of(target) {
            break;
        }
        let symbol = target
            .symbol(branch.path.len())
            .ok_or_else(|| collides_with_branch(target))?;
        let Some(&last) = branch.children.last() else {
            return Err(TrieError::structural(&branch.path, "branch has no children"));
        };
        if last < symbol {
            // the previous item is appended to this branch, which stays
            // intact and is reached again from that item
            return Ok(Some(Position::Work(previous)));
        }
        candidate = child_index(nodes, candidate, branch.children.len() - 1)?;
    }

    if nodes[candidate].path() > target {
        Ok(Some(Position::Storage(candidate)))
    } else {
        Ok(Some(Position::Work(previous)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restructure::fixtures::{forty_five, ten_nodes, upserts};
    use rstest::rstest;

    #[test]
    fn test_peek_left_no_work() {
        let nodes = ten_nodes();
        let expected = [None, None, None, Some(2), Some(1), Some(1), Some(5), Some(6), Some(4), Some(8)];
        for (index, want) in expected.into_iter().enumerate() {
            assert_eq!(peek_left_no_work(index, &nodes).unwrap(), want, "left of {}", index);
        }
    }

    #[test]
    fn test_peek_right_no_work() {
        let nodes = ten_nodes();
        let expected = [None, Some(4), Some(3), Some(4), Some(8), Some(6), Some(7), Some(8), Some(9), None];
        for (index, want) in expected.into_iter().enumerate() {
            assert_eq!(peek_right_no_work(index, &nodes).unwrap(), want, "right of {}", index);
        }
    }

    #[rstest]
    #[case("13322130", Some(0))]
    #[case("04322130", Some(0))]
    #[case("02112220", Some(4))]
    #[case("02212220", Some(8))]
    #[case("01331132", Some(7))]
    #[case("01311132", Some(6))]
    #[case("0 123456", None)]
    #[case(" 0123456", None)]
    #[case("00121211", None)]
    #[case("01013302", Some(1))]
    #[case("01 13302", Some(1))]
    #[case("01023302", Some(5))]
    #[case("00331132", Some(1))]
    #[case("0115", Some(5))]
    fn test_peek_left_from_first_work(#[case] path: &str, #[case] expected: Option<usize>) {
        let item = WorkItem::upsert(path, &b""[..]);
        assert_eq!(peek_left_from_first_work(&item, &ten_nodes()).unwrap(), expected);
    }

    #[rstest]
    #[case(&["00311002", "01421132"], Position::Storage(4))]
    #[case(&["01013302", "01102113"], Position::Work(1))]
    #[case(&["01202113", "01320132"], Position::Work(1))]
    #[case(&["01202113", "01322132"], Position::Storage(7))]
    #[case(&[" 1202113", "01322132"], Position::Storage(1))]
    #[case(&[" 1202113", "00131211"], Position::Work(1))]
    #[case(&[" 1202113", "00231211"], Position::Storage(2))]
    #[case(&["00211002", "02112220"], Position::Storage(4))]
    fn test_peek_right_from_work_ten_nodes(#[case] paths: &[&str], #[case] expected: Position) {
        let work = upserts(paths);
        assert_eq!(
            peek_right_from_work(0, &work, &ten_nodes()).unwrap(),
            Some(expected)
        );
    }

    #[rstest]
    #[case(&["4501", "4522"], Position::Storage(1))]
    #[case(&["4511", "4522"], Position::Storage(3))]
    #[case(&["4511", "4521"], Position::Work(1))]
    #[case(&["5511", "5621"], Position::Work(1))]
    #[case(&["3511", "4520"], Position::Storage(1))]
    fn test_peek_right_from_work_forty_five(#[case] paths: &[&str], #[case] expected: Position) {
        let work = upserts(paths);
        assert_eq!(
            peek_right_from_work(0, &work, &forty_five()).unwrap(),
            Some(expected)
        );
    }

    #[test]
    fn test_peek_right_from_node() {
        let nodes = forty_five();
        let work = upserts(&["4501", "4523"]);
        assert_eq!(
            peek_right_from_node(1, 0, &work, &nodes).unwrap(),
            Some(Position::Storage(2))
        );
        let work = upserts(&["4501", "4521"]);
        assert_eq!(
            peek_right_from_node(1, 0, &work, &nodes).unwrap(),
            Some(Position::Work(1))
        );
    }

    #[test]
    fn test_peek_right_keeps_branch_when_appending() {
        // "4523" lands after the last child of "452"
        let nodes = forty_five();
        let work = upserts(&["4501", "4523"]);
        assert_eq!(
            peek_right(Position::Storage(1), 0, &work, &nodes).unwrap(),
            Some(Position::Storage(2))
        );
        assert_eq!(
            peek_right(Position::Storage(2), 0, &work, &nodes).unwrap(),
            Some(Position::Work(1))
        );
        assert_eq!(peek_right(Position::Work(1), 1, &work, &nodes).unwrap(), None);
    }

    #[test]
    fn test_peek_left_from_work_reconciles_previous_item() {
        let nodes = forty_five();
        let work = upserts(&["4513", "4531"]);
        // "45" would stay intact for "4531" alone, but "4513" lands inside it
        assert_eq!(
            peek_left_from_work(1, &work, &nodes).unwrap(),
            Some(Position::Storage(2))
        );
        assert_eq!(
            peek_left_from_node(2, 1, &work, &nodes).unwrap(),
            Some(Position::Work(0))
        );
        assert_eq!(
            peek_left(Position::Work(0), 0, &work, &nodes).unwrap(),
            Some(Position::Storage(1))
        );
        assert_eq!(peek_left(Position::Storage(1), 0, &work, &nodes).unwrap(), None);
    }

    #[test]
    fn test_peek_left_skips_superseded_leaf() {
        let nodes = forty_five();
        let work = upserts(&["4511", "4522"]);
        assert_eq!(
            peek_left_from_work(1, &work, &nodes).unwrap(),
            Some(Position::Storage(3))
        );
        assert_eq!(
            peek_left_from_node(3, 1, &work, &nodes).unwrap(),
            Some(Position::Work(0))
        );
        assert_eq!(peek_left_from_work(0, &work, &nodes).unwrap(), None);
    }

    #[test]
    fn test_peek_on_empty_storage() {
        let work = upserts(&["1", "2"]);
        assert_eq!(peek_left_from_first_work(&work[0], &[]).unwrap(), None);
        assert_eq!(
            peek_right_from_work(0, &work, &[]).unwrap(),
            Some(Position::Work(1))
        );
        assert_eq!(peek_right_from_work(1, &work, &[]).unwrap(), None);
        assert_eq!(
            peek_left_from_work(1, &work, &[]).unwrap(),
            Some(Position::Work(0))
        );
    }

    #[test]
    fn test_leaf_colliding_with_branch_is_rejected() {
        let work = upserts(&["452"]);
        assert!(matches!(
            peek_right_from_work(0, &work, &forty_five()),
            Err(TrieError::StructuralInconsistency { .. })
        ));
        assert!(matches!(
            peek_left_from_first_work(&work[0], &forty_five()),
            Err(TrieError::StructuralInconsistency { .. })
        ));
    }
}
