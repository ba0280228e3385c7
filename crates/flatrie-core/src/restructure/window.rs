//! The transformation window: the contiguous slice of the trie a batch can change

use super::peek::{
    peek_left, peek_left_from_first_work, peek_left_from_work, peek_left_no_work, peek_right,
    peek_right_from_work, Position,
};
use crate::error::{Result, TrieError};
use crate::node::{StoredNode, WorkItem};
use crate::path::Path;
use crate::storage::lower_bound;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Which end of the batch the window walk is anchored at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// Anchor at the first work item, walk left through storage then right
    /// through storage and work
    #[default]
    Forward,
    /// Anchor at the last work item, walk left through storage and work then
    /// right through storage
    Backward,
}

/// Reject an empty, unsorted or duplicated batch.
pub fn check_batch(work: &[WorkItem]) -> Result<()> {
    if work.is_empty() {
        return Err(TrieError::EmptyBatch);
    }
    for pair in work.windows(2) {
        if pair[0].path == pair[1].path {
            return Err(TrieError::DuplicateWorkPath(pair[0].path.clone()));
        }
        if pair[0].path > pair[1].path {
            return Err(TrieError::UnsortedInput {
                first: pair[0].path.clone(),
                second: pair[1].path.clone(),
            });
        }
    }
    Ok(())
}

/// A window element resolved to the node it refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowNode<'a> {
    /// Intact committed subtree, represented by its top node
    Stored(&'a StoredNode),
    /// Pending leaf
    Pending(&'a WorkItem),
}

impl WindowNode<'_> {
    /// Path of the element
    pub fn path(&self) -> &Path {
        match self {
            WindowNode::Stored(node) => node.path(),
            WindowNode::Pending(item) => &item.path,
        }
    }
}

/// Ordered storage/work positions that a batch can affect.
///
/// Every ancestor of a work position is dissolved into its children, so the
/// window together with those ancestors tiles the whole node array. Deleted
/// work items are dropped, since they contribute nothing to the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Window {
    positions: Vec<Position>,
}

impl Window {
    /// Build the window by a forward walk
    pub fn build(work: &[WorkItem], nodes: &[StoredNode]) -> Result<Self> {
        Self::build_with(work, nodes, Traversal::Forward)
    }

    /// Build the window with the given traversal
    pub fn build_with(work: &[WorkItem], nodes: &[StoredNode], traversal: Traversal) -> Result<Self> {
        check_batch(work)?;

        // A delete only takes part when a committed leaf sits at its path.
        let live: Vec<usize> = (0..work.len())
            .filter(|&index| !work[index].is_delete() || holds_leaf(nodes, &work[index].path))
            .collect();
        if live.is_empty() {
            let positions = if nodes.is_empty() {
                Vec::new()
            } else {
                vec![Position::Storage(0)]
            };
            return Ok(Self { positions });
        }

        let batch: Cow<'_, [WorkItem]> = if live.len() == work.len() {
            Cow::Borrowed(work)
        } else {
            Cow::Owned(live.iter().map(|&index| work[index].clone()).collect())
        };
        let positions = match traversal {
            Traversal::Forward => walk_forward(&batch, nodes)?,
            Traversal::Backward => walk_backward(&batch, nodes)?,
        };
        let positions = positions
            .into_iter()
            .filter_map(|position| match position {
                Position::Work(index) => {
                    let index = live[index];
                    (!work[index].is_delete()).then_some(Position::Work(index))
                }
                Position::Storage(_) => Some(position),
            })
            .collect();
        Ok(Self { positions })
    }

    /// Positions in trie order
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if the batch leaves nothing behind
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Resolve every position to its node
    pub fn nodes<'a>(&self, work: &'a [WorkItem], nodes: &'a [StoredNode]) -> Vec<WindowNode<'a>> {
        self.positions
            .iter()
            .map(|position| match *position {
                Position::Storage(index) => WindowNode::Stored(&nodes[index]),
                Position::Work(index) => WindowNode::Pending(&work[index]),
            })
            .collect()
    }
}

/// Build the forward window and resolve it to nodes.
pub fn generate_transformation_list<'a>(
    work: &'a [WorkItem],
    nodes: &'a [StoredNode],
) -> Result<Vec<WindowNode<'a>>> {
    Ok(Window::build(work, nodes)?.nodes(work, nodes))
}

fn holds_leaf(nodes: &[StoredNode], path: &Path) -> bool {
    nodes
        .get(lower_bound(nodes, path))
        .is_some_and(|node| !node.is_branch() && node.path() == path)
}

fn stalled(nodes: &[StoredNode], index: usize) -> TrieError {
    TrieError::structural(nodes[index].path(), "neighbor walk did not advance")
}

fn walk_forward(work: &[WorkItem], nodes: &[StoredNode]) -> Result<Vec<Position>> {
    let mut positions = Vec::new();

    let mut prepend = peek_left_from_first_work(&work[0], nodes)?;
    while let Some(index) = prepend {
        if let Some(Position::Storage(last)) = positions.last() {
            if index >= *last {
                return Err(stalled(nodes, index));
            }
        }
        positions.push(Position::Storage(index));
        prepend = peek_left_no_work(index, nodes)?;
    }
    positions.reverse();

    let mut current_work = 0;
    let mut last_storage = positions.iter().rev().find_map(|position| match position {
        Position::Storage(index) => Some(*index),
        Position::Work(_) => None,
    });
    positions.push(Position::Work(0));

    let mut append = peek_right(Position::Work(0), current_work, work, nodes)?;
    while let Some(position) = append {
        match position {
            Position::Work(index) => current_work = index,
            Position::Storage(index) => {
                if last_storage.is_some_and(|last| index <= last) {
                    return Err(stalled(nodes, index));
                }
                last_storage = Some(index);
            }
        }
        positions.push(position);
        append = peek_right(position, current_work, work, nodes)?;
    }
    Ok(positions)
}

fn walk_backward(work: &[WorkItem], nodes: &[StoredNode]) -> Result<Vec<Position>> {
    let anchor = work.len() - 1;
    let mut positions = Vec::new();

    let mut current_work = anchor;
    let mut last_storage: Option<usize> = None;
    let mut prepend = peek_left_from_work(anchor, work, nodes)?;
    while let Some(position) = prepend {
        match position {
            Position::Work(index) => current_work = index,
            Position::Storage(index) => {
                if last_storage.is_some_and(|last| index >= last) {
                    return Err(stalled(nodes, index));
                }
                last_storage = Some(index);
            }
        }
        positions.push(position);
        prepend = peek_left(position, current_work, work, nodes)?;
    }
    positions.reverse();
    positions.push(Position::Work(anchor));

    let mut last_storage: Option<usize> = None;
    let mut append = peek_right_from_work(anchor, work, nodes)?;
    while let Some(position) = append {
        if let Position::Storage(index) = position {
            if last_storage.is_some_and(|last| index <= last) {
                return Err(stalled(nodes, index));
            }
            last_storage = Some(index);
        }
        positions.push(position);
        append = peek_right(position, anchor, work, nodes)?;
    }
    Ok(positions)
}
