//! Spool directory configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How pending spool records are picked up and drained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolConfig {
    /// Directory holding pending spool records.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Maximum number of records processed at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-record time limit in seconds (read + emit).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delete a record once its audit message was dispatched.
    #[serde(default)]
    pub delete_processed: bool,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            delete_processed: false,
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("spool")
}

fn default_concurrency() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    30
}
