//! # atna-core
//!
//! Configuration types shared across the ATNA crates.
//!
//! Configuration is loaded from a single YAML file (`atna.yaml`) with three
//! sections: `audit`, `spool` and `transport`. Every section and field has a
//! default, so an empty file is a valid configuration.

// Configuration types shared across all ATNA crates
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{
    AtnaConfig, AuditConfig, CodeDefinition, ConfigError, EventCategory, EventTypeDefinition,
    SpoolConfig, TransportBackend, TransportConfig,
};
