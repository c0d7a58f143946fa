//! Configuration types for the ATNA audit engine.
//!
//! This module provides the unified configuration used by the engine and the
//! CLI. Configuration is loaded from a YAML file and every section is
//! optional.
//!
//! # Sections
//!
//! - **audit**: engine switches, process identity override and custom event types
//! - **spool**: where pending spool records live and how they are drained
//! - **transport**: where finished audit messages are delivered

pub mod audit;
pub mod spool;
pub mod transport;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub use audit::{AuditConfig, CodeDefinition, EventCategory, EventTypeDefinition};
pub use spool::SpoolConfig;
pub use transport::{TransportBackend, TransportConfig};

/// Complete ATNA configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtnaConfig {
    /// Audit engine configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Spool directory processing.
    #[serde(default)]
    pub spool: SpoolConfig,

    /// Audit message delivery.
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtnaConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to `null`, which we treat as all defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spool.concurrency == 0 {
            return Err(ConfigError::Config(
                "spool.concurrency must be at least 1".to_string(),
            ));
        }
        if self.spool.timeout_secs == 0 {
            return Err(ConfigError::Config(
                "spool.timeout_secs must be at least 1".to_string(),
            ));
        }

        let mut tags = HashSet::new();
        for definition in &self.audit.event_types {
            if definition.tag.trim().is_empty() {
                return Err(ConfigError::Config(
                    "audit.event_types entries need a non-empty tag".to_string(),
                ));
            }
            if !tags.insert(definition.tag.as_str()) {
                return Err(ConfigError::Config(format!(
                    "duplicate event type tag: {}",
                    definition.tag
                )));
            }
        }

        if matches!(
            self.transport.backend,
            TransportBackend::File | TransportBackend::Dual
        ) && self.transport.file_path.as_os_str().is_empty()
        {
            return Err(ConfigError::Config(
                "transport.file_path is required for file output".to_string(),
            ));
        }

        Ok(())
    }
}
