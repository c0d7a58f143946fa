//! Error types for the audit crate.
//!
//! Only two things can stop an invocation: an unreadable spool record and a
//! transport that refuses the finished message. Missing fields inside a
//! readable record are never errors.

use std::path::PathBuf;
use thiserror::Error;

/// The spool record cannot be turned into audit info.
///
/// The record is left untouched for caller-level retry or alerting.
#[derive(Debug, Error)]
pub enum SpoolCorruptError {
    /// The file could not be read.
    #[error("cannot read spool file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not UTF-8 text.
    #[error("spool file {} is not valid UTF-8", .path.display())]
    InvalidEncoding { path: PathBuf },

    /// The file has no primary record line.
    #[error("spool file {} has no primary record line", .path.display())]
    MissingPrimaryLine { path: PathBuf },
}

impl SpoolCorruptError {
    /// Path of the offending spool file.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Unreadable { path, .. }
            | Self::InvalidEncoding { path }
            | Self::MissingPrimaryLine { path } => path,
        }
    }
}

/// The audit transport failed to accept a message.
#[derive(Debug, Error)]
pub enum AuditDispatchError {
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport refused the message.
    #[error("audit repository rejected message: {0}")]
    Rejected(String),
}

/// Errors returned by [`crate::AuditService::audit`].
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    SpoolCorrupt(#[from] SpoolCorruptError),

    #[error(transparent)]
    Dispatch(#[from] AuditDispatchError),
}
