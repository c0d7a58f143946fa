//! `atna process` command implementation.
//!
//! Audits a single spool record. The record is deleted only after its
//! message was sent and only when deletion was requested.

use anyhow::{Context, Result, anyhow};
use atna_audit::{AuditService, EventTypeRegistry, create_transport};
use atna_core::AtnaConfig;
use std::path::Path;
use std::time::Duration;

pub async fn run_process(
    config: &AtnaConfig,
    file: &Path,
    event_type: &str,
    delete: bool,
) -> Result<()> {
    if !config.audit.enabled {
        tracing::warn!("Audit is disabled in configuration, record left in place");
        return Ok(());
    }

    let registry = EventTypeRegistry::from_config(&config.audit)?;
    let event_type = registry
        .get(event_type)
        .ok_or_else(|| anyhow!("Unknown event type: {} (see `atna event-types`)", event_type))?;

    let service = AuditService::new(&config.audit, create_transport(&config.transport));
    let timeout = Duration::from_secs(config.spool.timeout_secs);

    let message = tokio::time::timeout(timeout, service.audit(file, event_type))
        .await
        .map_err(|_| anyhow!("Timed out after {}s", config.spool.timeout_secs))?
        .with_context(|| format!("Failed to audit {}", file.display()))?;

    tracing::info!(
        path = %file.display(),
        message_id = %message.message_id,
        "{}",
        message.to_log_line()
    );

    if delete || config.spool.delete_processed {
        tokio::fs::remove_file(file)
            .await
            .with_context(|| format!("Failed to delete {}", file.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atna_audit::{AuditField, AuditInfo};
    use atna_core::TransportBackend;

    fn config(dir: &Path) -> AtnaConfig {
        let mut config = AtnaConfig::default();
        config.transport.backend = TransportBackend::File;
        config.transport.file_path = dir.join("messages.jsonl");
        config
    }

    fn write_record(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("record");
        let line = AuditInfo::from_fields([
            (AuditField::ConnType, "FAILED"),
            (AuditField::CallingUserId, "ARCHIVE1"),
        ])
        .encode();
        std::fs::write(&path, line).unwrap();
        path
    }

    #[tokio::test]
    async fn test_process_keeps_record_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_record(dir.path());
        let config = config(dir.path());

        run_process(&config, &record, "connection-failed", false)
            .await
            .unwrap();

        assert!(record.exists());
        let sent = std::fs::read_to_string(dir.path().join("messages.jsonl")).unwrap();
        assert_eq!(sent.lines().count(), 1);
        assert!(sent.contains("ARCHIVE1"));
    }

    #[tokio::test]
    async fn test_process_deletes_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_record(dir.path());

        run_process(&config(dir.path()), &record, "connection-failed", true)
            .await
            .unwrap();
        assert!(!record.exists());
    }

    #[tokio::test]
    async fn test_process_unknown_event_type() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_record(dir.path());

        let err = run_process(&config(dir.path()), &record, "nope", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown event type"));
        assert!(record.exists());
    }

    #[tokio::test]
    async fn test_process_corrupt_record_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("empty");
        std::fs::write(&record, "").unwrap();

        let result = run_process(&config(dir.path()), &record, "connection-failed", true).await;
        assert!(result.is_err());
        assert!(record.exists());
        assert!(!dir.path().join("messages.jsonl").exists());
    }
}
