//! `atna check` command implementation.
//!
//! Configuration is already parsed and validated when this runs; the check
//! additionally builds the event-type registry so that bad custom event types
//! are reported before a drain.

use anyhow::{Context, Result};
use atna_audit::EventTypeRegistry;
use atna_core::AtnaConfig;

pub fn run_check(config: &AtnaConfig) -> Result<()> {
    let registry =
        EventTypeRegistry::from_config(&config.audit).context("Invalid event type definition")?;

    println!("Configuration OK");
    println!("  audit enabled:    {}", config.audit.enabled);
    println!("  event types:      {}", registry.len());
    println!("  spool directory:  {}", config.spool.directory.display());
    println!(
        "  concurrency:      {} (timeout {}s)",
        config.spool.concurrency, config.spool.timeout_secs
    );
    println!("  transport:        {:?}", config.transport.backend);

    if !config.spool.directory.is_dir() {
        tracing::warn!(
            dir = %config.spool.directory.display(),
            "Spool directory does not exist yet"
        );
    }
    Ok(())
}
