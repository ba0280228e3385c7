//! Incremental restructuring of the flat trie
//!
//! A sorted batch of leaf operations is applied in three stages:
//! - Navigation over storage and pending work recovers the window of intact
//!   subtrees and pending leaves the batch can touch
//! - Local four-node merge decisions fuse that window back into one root
//! - The root is flattened and compared against storage to find the smallest
//!   splice

mod affected;
mod peek;
mod siblings;
mod transform;
mod update;
mod window;

#[cfg(test)]
pub(crate) mod fixtures;

pub use affected::find_affected_node;
pub use peek::{
    peek_left, peek_left_from_first_work, peek_left_from_node, peek_left_from_work,
    peek_left_no_work, peek_right, peek_right_from_node, peek_right_from_work, peek_right_no_work,
    Position,
};
pub use siblings::{are_siblings, find_parent_index, is_first_in_branch, parent_path};
pub use transform::{apply_merge, transform, Merge, Subtree};
pub use update::{apply, apply_with, reduce, Update, UpdateConfig};
pub use window::{check_batch, generate_transformation_list, Traversal, Window, WindowNode};
