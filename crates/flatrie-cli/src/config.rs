//! Driver configuration

use flatrie_core::{Traversal, UpdateConfig};
use serde::{Deserialize, Serialize};

/// Settings shared by every subcommand
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliConfig {
    /// Window traversal direction
    pub traversal: Traversal,
    /// Validate loaded node arrays before applying work
    pub verify_storage: bool,
    /// Sort work batches by path after loading
    pub sort_work: bool,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            traversal: Traversal::Forward,
            verify_storage: true,
            sort_work: false,
            pretty: true,
        }
    }
}

impl CliConfig {
    /// Core configuration for applying a batch
    pub fn update_config(&self) -> UpdateConfig {
        UpdateConfig {
            traversal: self.traversal,
            verify_storage: self.verify_storage,
        }
    }
}
