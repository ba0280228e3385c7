//! Error types for the flatrie-core crate

use crate::Path;
use thiserror::Error;

/// Result type alias using `TrieError`
pub type Result<T> = std::result::Result<T, TrieError>;

/// Errors raised when the node array or work batch breaks an invariant.
///
/// None of these are expected at runtime: they mean the caller handed over a
/// corrupted or unsorted input, and the whole batch is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// Storage or work is not in ascending path order
    #[error("unsorted input: {first} does not sort before {second}")]
    UnsortedInput { first: Path, second: Path },

    /// Two work items (or two bulk-loaded leaves) share a path
    #[error("duplicate work path: {0}")]
    DuplicateWorkPath(Path),

    /// No branch exists where one is required
    #[error("missing parent branch at {path} for node {index}")]
    MissingParent { path: Path, index: usize },

    /// A branch disagrees with the subtrees that follow it
    #[error("structural inconsistency at {path}: {reason}")]
    StructuralInconsistency { path: Path, reason: String },

    /// A node index past the end of the array
    #[error("node index {index} out of range for {len} nodes")]
    IndexOutOfRange { index: usize, len: usize },

    /// The work batch is empty
    #[error("empty work batch")]
    EmptyBatch,
}

impl TrieError {
    pub(crate) fn structural(path: &Path, reason: impl Into<String>) -> Self {
        TrieError::StructuralInconsistency {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}
