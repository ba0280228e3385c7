//! Node types: committed storage entries and pending work items

use crate::Path;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A committed leaf
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// Full path of the leaf
    pub path: Path,
    /// Opaque payload
    #[serde(with = "hex_bytes")]
    pub value: Bytes,
}

impl Leaf {
    /// Create a new leaf
    pub fn new(path: impl Into<Path>, value: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// A branch entry in the flat node array.
///
/// The branch does not own its children. It records one symbol per child: the
/// symbol right after `path` on the way to that child. The child subtrees
/// themselves follow the branch in the array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Shared prefix of every node in the subtree
    pub path: Path,
    /// Next symbol of each child, strictly ascending
    #[serde(with = "crate::path::symbol_text")]
    pub children: Vec<u8>,
}

impl Branch {
    /// Create a new branch
    pub fn new(path: impl Into<Path>, children: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            children: children.into(),
        }
    }

    /// Position of `symbol` among the children
    pub fn child_position(&self, symbol: u8) -> Option<usize> {
        self.children.binary_search(&symbol).ok()
    }

    /// Path prefix shared by the subtree of the child at `position`
    pub fn child_prefix(&self, position: usize) -> Option<Path> {
        self.children.get(position).map(|&sym| self.path.child(sym))
    }
}

/// An entry of the storage array
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoredNode {
    Leaf(Leaf),
    Branch(Branch),
}

impl StoredNode {
    /// Shorthand for a leaf entry
    pub fn leaf(path: impl Into<Path>, value: impl Into<Bytes>) -> Self {
        StoredNode::Leaf(Leaf::new(path, value))
    }

    /// Shorthand for a branch entry
    pub fn branch(path: impl Into<Path>, children: impl Into<Vec<u8>>) -> Self {
        StoredNode::Branch(Branch::new(path, children))
    }

    /// Path of the node
    pub fn path(&self) -> &Path {
        match self {
            StoredNode::Leaf(leaf) => &leaf.path,
            StoredNode::Branch(branch) => &branch.path,
        }
    }

    /// Check if this is a branch
    pub fn is_branch(&self) -> bool {
        matches!(self, StoredNode::Branch(_))
    }

    /// Get the branch if this is one
    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            StoredNode::Branch(branch) => Some(branch),
            StoredNode::Leaf(_) => None,
        }
    }

    /// Get the leaf if this is one
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            StoredNode::Leaf(leaf) => Some(leaf),
            StoredNode::Branch(_) => None,
        }
    }
}

impl From<Leaf> for StoredNode {
    fn from(leaf: Leaf) -> Self {
        StoredNode::Leaf(leaf)
    }
}

impl From<Branch> for StoredNode {
    fn from(branch: Branch) -> Self {
        StoredNode::Branch(branch)
    }
}

/// What a pending work item does to its path
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Insert the leaf, or replace the value of an existing one
    Upsert {
        #[serde(with = "hex_bytes")]
        value: Bytes,
    },
    /// Remove the leaf if present
    Delete,
}

/// A pending leaf operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Path of the affected leaf
    pub path: Path,
    /// Operation to apply
    #[serde(flatten)]
    pub action: Action,
}

impl WorkItem {
    /// Insert or update a leaf
    pub fn upsert(path: impl Into<Path>, value: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            action: Action::Upsert {
                value: value.into(),
            },
        }
    }

    /// Remove a leaf
    pub fn delete(path: impl Into<Path>) -> Self {
        Self {
            path: path.into(),
            action: Action::Delete,
        }
    }

    /// Check if this item removes its leaf
    pub fn is_delete(&self) -> bool {
        matches!(self.action, Action::Delete)
    }

    /// The committed leaf this item turns into, if any
    pub fn to_leaf(&self) -> Option<Leaf> {
        match &self.action {
            Action::Upsert { value } => Some(Leaf {
                path: self.path.clone(),
                value: value.clone(),
            }),
            Action::Delete => None,
        }
    }
}

mod hex_bytes {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        hex::encode(value).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
