//! # Flatrie Core
//!
//! Pointer-free Patricia trie kept as one preorder-sorted node array, with
//! incremental batch restructuring.
//!
//! This crate provides:
//! - **Path algebra**: ordering and longest-common-prefix over symbol paths
//! - **Flat storage**: the node array, its invariant check and bulk builder
//! - **Neighbor navigation**: parents, siblings and left/right neighbors
//!   recovered from adjacency and binary search
//! - **Batch restructuring**: window building, local merge decisions and the
//!   minimal splice that applies a sorted batch of upserts and deletes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Storage::apply_batch             │
//! ├─────────────────────────────────────────┤
//! │   apply: window → reduce → splice       │
//! ├───────────────────┬─────────────────────┤
//! │  Window builder   │   Merge decider     │
//! ├───────────────────┴─────────────────────┤
//! │  Neighbor navigation │ Sibling indexing │
//! ├─────────────────────────────────────────┤
//! │    Path algebra  │  Sorted node array   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use flatrie_core::{Storage, WorkItem};
//!
//! let mut storage = Storage::new();
//! storage
//!     .apply_batch(&[
//!         WorkItem::upsert("4511", &b"a"[..]),
//!         WorkItem::upsert("4521", &b"b"[..]),
//!     ])
//!     .unwrap();
//! storage.apply_batch(&[WorkItem::upsert("4522", &b"c"[..])]).unwrap();
//!
//! let paths: Vec<String> = storage.nodes().iter().map(|n| n.path().to_string()).collect();
//! assert_eq!(paths, ["45", "4511", "452", "4521", "4522"]);
//! ```

pub mod error;
pub mod node;
pub mod path;
pub mod restructure;
pub mod storage;

pub use error::{Result, TrieError};
pub use node::{Action, Branch, Leaf, StoredNode, WorkItem};
pub use path::{common_prefix_len, longest_common_prefix, Path};
pub use restructure::{apply, apply_with, Position, Traversal, Update, UpdateConfig};
pub use storage::Storage;
