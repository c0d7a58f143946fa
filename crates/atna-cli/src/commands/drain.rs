//! `atna drain` command implementation.
//!
//! Walks a spool directory laid out as `<dir>/<event-type>/<record>` and
//! audits every record, one task per record with at most `spool.concurrency`
//! running at once. Each record is one unit of work: it either completes
//! (message sent, record optionally deleted) or fails and stays in place for
//! the next run.

use anyhow::{Context, Result, bail};
use atna_audit::{AuditService, EventType, EventTypeRegistry, create_transport};
use atna_core::{AtnaConfig, SpoolConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One spool record and the event type of its directory.
#[derive(Debug, Clone)]
pub struct SpoolJob {
    pub path: PathBuf,
    pub event_type: EventType,
}

/// Result of processing one record.
#[derive(Debug)]
pub enum JobOutcome {
    Processed,
    Failed,
    TimedOut,
}

/// Counts per outcome after a drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub processed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped_dirs: usize,
}

pub async fn run_drain(config: &AtnaConfig, dir: Option<&Path>, delete: bool) -> Result<()> {
    if !config.audit.enabled {
        tracing::warn!("Audit is disabled in configuration, nothing drained");
        return Ok(());
    }

    let mut spool = config.spool.clone();
    if let Some(dir) = dir {
        spool.directory = dir.to_path_buf();
    }
    spool.delete_processed |= delete;

    let registry = EventTypeRegistry::from_config(&config.audit)?;
    let service = AuditService::new(&config.audit, create_transport(&config.transport));

    let summary = drain_directory(&service, &registry, &spool).await?;
    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        timed_out = summary.timed_out,
        skipped_dirs = summary.skipped_dirs,
        "Spool drained"
    );

    let unprocessed = summary.failed + summary.timed_out;
    if unprocessed > 0 {
        bail!("{} spool records could not be processed", unprocessed);
    }
    Ok(())
}

/// Collect the jobs found under `directory`.
///
/// Subdirectories whose name is not a known event-type tag are skipped, as
/// are hidden files.
pub fn collect_jobs(
    directory: &Path,
    registry: &EventTypeRegistry,
) -> Result<(Vec<SpoolJob>, usize)> {
    let mut jobs = Vec::new();
    let mut skipped_dirs = 0;

    let entries = fs::read_dir(directory)
        .with_context(|| format!("Failed to read spool directory: {}", directory.display()))?;
    let mut type_dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    type_dirs.sort();

    for type_dir in type_dirs {
        let tag = type_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let Some(event_type) = registry.get(tag) else {
            tracing::warn!(dir = %type_dir.display(), "Unknown event type directory, skipping");
            skipped_dirs += 1;
            continue;
        };

        let mut records: Vec<PathBuf> = fs::read_dir(&type_dir)
            .with_context(|| format!("Failed to read spool directory: {}", type_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && !is_hidden(path))
            .collect();
        records.sort();

        jobs.extend(records.into_iter().map(|path| SpoolJob {
            path,
            event_type: event_type.clone(),
        }));
    }

    Ok((jobs, skipped_dirs))
}

/// Process every record under the spool directory.
pub async fn drain_directory(
    service: &AuditService,
    registry: &EventTypeRegistry,
    spool: &SpoolConfig,
) -> Result<DrainSummary> {
    let (jobs, skipped_dirs) = collect_jobs(&spool.directory, registry)?;
    tracing::debug!(records = jobs.len(), "Collected spool records");

    let timeout = Duration::from_secs(spool.timeout_secs);
    let semaphore = Arc::new(Semaphore::new(spool.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Spool worker pool closed")?;
        let service = service.clone();
        let delete = spool.delete_processed;
        tasks.spawn(async move {
            let outcome = process_job(&service, job, timeout, delete).await;
            drop(permit);
            outcome
        });
    }

    let mut summary = DrainSummary {
        skipped_dirs,
        ..Default::default()
    };
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(JobOutcome::Processed) => summary.processed += 1,
            Ok(JobOutcome::Failed) => summary.failed += 1,
            Ok(JobOutcome::TimedOut) => summary.timed_out += 1,
            Err(e) => {
                tracing::error!(error = %e, "Spool worker task aborted");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

async fn process_job(
    service: &AuditService,
    job: SpoolJob,
    timeout: Duration,
    delete: bool,
) -> JobOutcome {
    let result = tokio::time::timeout(timeout, service.audit(&job.path, &job.event_type)).await;

    match result {
        Ok(Ok(message)) => {
            tracing::info!(
                path = %job.path.display(),
                event_type = %job.event_type.tag,
                message_id = %message.message_id,
                "Spool record processed"
            );
            if delete {
                if let Err(e) = tokio::fs::remove_file(&job.path).await {
                    tracing::warn!(path = %job.path.display(), error = %e, "Failed to delete spool record");
                }
            }
            JobOutcome::Processed
        }
        Ok(Err(e)) => {
            tracing::error!(path = %job.path.display(), error = %e, "Spool record not processed");
            JobOutcome::Failed
        }
        Err(_) => {
            tracing::error!(
                path = %job.path.display(),
                timeout_secs = timeout.as_secs(),
                "Spool record timed out"
            );
            JobOutcome::TimedOut
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
