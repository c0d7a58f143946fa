//! Audit message delivery configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where finished audit messages are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport backend.
    #[serde(default)]
    pub backend: TransportBackend,

    /// JSON Lines output file (for `file` and `dual` backends).
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: TransportBackend::default(),
            file_path: default_file_path(),
        }
    }
}

/// Transport backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportBackend {
    /// Print messages to stdout.
    #[default]
    Console,
    /// Append messages to a file.
    File,
    /// File and stdout.
    Dual,
    /// Discard messages.
    Null,
}

fn default_file_path() -> PathBuf {
    PathBuf::from("audit-messages.jsonl")
}
