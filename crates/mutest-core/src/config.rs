//! Configuration for the mutation engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Random seed for reproducible mutant selection
    pub seed: u64,
    /// Path to the persisted mutation history file, if non-repetition
    /// across invocations is wanted
    pub history_path: Option<PathBuf>,
    /// Upper bound on redraws when a rule rejects candidates that equal
    /// the original value or already appear in the history
    pub max_draw_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            history_path: None,
            max_draw_attempts: 64,
        }
    }
}

impl EngineConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}
