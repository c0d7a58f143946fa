//! Audit message transports.
//!
//! A transport delivers a finished [`AuditMessage`] to the audit repository
//! and reports success or failure synchronously to the caller of `send`.

use async_trait::async_trait;
use atna_core::config::{TransportBackend, TransportConfig};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::emitter::AuditMessage;
use crate::error::AuditDispatchError;

/// Trait for audit message transports.
#[async_trait]
pub trait AuditTransport: Send + Sync {
    /// Deliver one audit message.
    async fn send(&self, message: &AuditMessage) -> Result<(), AuditDispatchError>;
}

/// Create a transport based on configuration.
pub fn create_transport(config: &TransportConfig) -> Arc<dyn AuditTransport> {
    match config.backend {
        TransportBackend::Console => Arc::new(ConsoleTransport),
        TransportBackend::File => Arc::new(FileTransport::new(&config.file_path)),
        TransportBackend::Dual => Arc::new(DualTransport::new(&config.file_path)),
        TransportBackend::Null => Arc::new(NullTransport),
    }
}

/// Console transport (JSON to stdout).
pub struct ConsoleTransport;

#[async_trait]
impl AuditTransport for ConsoleTransport {
    async fn send(&self, message: &AuditMessage) -> Result<(), AuditDispatchError> {
        let json = serde_json::to_string(message)?;
        println!("{}", json);
        Ok(())
    }
}

/// File transport (appends JSON Lines).
pub struct FileTransport {
    path: PathBuf,
    // Serializes appends from concurrent senders
    write_lock: Mutex<()>,
}

impl FileTransport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditTransport for FileTransport {
    async fn send(&self, message: &AuditMessage) -> Result<(), AuditDispatchError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// File plus console.
pub struct DualTransport {
    file: FileTransport,
    console: ConsoleTransport,
}

impl DualTransport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: FileTransport::new(path),
            console: ConsoleTransport,
        }
    }
}

#[async_trait]
impl AuditTransport for DualTransport {
    async fn send(&self, message: &AuditMessage) -> Result<(), AuditDispatchError> {
        self.file.send(message).await?;
        self.console.send(message).await
    }
}

/// Discards every message.
pub struct NullTransport;

#[async_trait]
impl AuditTransport for NullTransport {
    async fn send(&self, _message: &AuditMessage) -> Result<(), AuditDispatchError> {
        Ok(())
    }
}

/// Keeps messages in memory. Useful for tests and dry runs.
#[derive(Default)]
pub struct MemoryTransport {
    messages: RwLock<Vec<AuditMessage>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, in send order.
    pub fn messages(&self) -> Vec<AuditMessage> {
        self.messages
            .read()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditTransport for MemoryTransport {
    async fn send(&self, message: &AuditMessage) -> Result<(), AuditDispatchError> {
        let mut messages = self.messages.write().map_err(|e| {
            AuditDispatchError::Rejected(format!("Failed to acquire write lock: {}", e))
        })?;
        messages.push(message.clone());
        Ok(())
    }
}
