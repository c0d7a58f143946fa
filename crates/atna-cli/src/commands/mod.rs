//! CLI command implementations for the ATNA spool processor.

pub mod check;
pub mod drain;
pub mod event_types;
pub mod process;

use anyhow::{Context, Result};
use atna_core::AtnaConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "atna.yaml";

/// Install the global tracing subscriber.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load and validate configuration.
///
/// An explicit path must exist. Without one, `./atna.yaml` is used if present
/// and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AtnaConfig> {
    let config = match path {
        Some(path) => AtnaConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AtnaConfig::from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("Failed to load config: {}", DEFAULT_CONFIG_FILE))?
        }
        None => {
            tracing::debug!("No configuration file, using defaults");
            AtnaConfig::default()
        }
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
