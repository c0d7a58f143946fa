//! # atna-audit
//!
//! Audit event assembly for a clinical imaging archive.
//!
//! When something audit-worthy happens (a network connection fails, a study
//! is deleted) the triggering subsystem writes a compact spool record and
//! returns immediately. This crate turns such a record into an ATNA-style
//! audit message out of band:
//!
//! 1. **Spool codec** ([`spool`]) decodes the record into [`AuditInfo`]
//! 2. **Classifier** ([`event::classify`]) derives the event identification
//! 3. **Role assigner** ([`participant`]) builds the active participants
//! 4. **Emitter** ([`AuditEmitter`]) composes the message and hands it to an
//!    injected [`AuditTransport`]
//!
//! ## Errors
//!
//! | Error | When |
//! |-------|------|
//! | [`SpoolCorruptError`] | The record is unreadable or has no primary line |
//! | [`AuditDispatchError`] | The transport refused the message |
//!
//! Missing fields inside a readable record are never errors.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use atna_audit::{AuditService, EventTypeRegistry, ConsoleTransport};
//! use atna_core::AuditConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = EventTypeRegistry::builtin();
//! let service = AuditService::new(&AuditConfig::default(), Arc::new(ConsoleTransport));
//!
//! let event_type = registry.get("connection-failed").ok_or("unknown event type")?;
//! let message = service.audit("spool/connection-failed/0001", event_type).await?;
//! println!("{}", message.to_log_line());
//! # Ok(())
//! # }
//! ```

pub mod emitter;
pub mod error;
pub mod event;
pub mod network;
pub mod participant;
pub mod registry;
pub mod service;
pub mod spool;
pub mod transport;

pub use emitter::{AuditEmitter, AuditMessage};
pub use error::{AuditDispatchError, AuditError, SpoolCorruptError};
pub use event::{
    CodedValue, EventActionCode, EventIdentification, EventOutcomeIndicator, EventType, classify,
};
pub use network::{NetworkAccessPointKind, classify_host};
pub use participant::{
    ActiveParticipant, ConnectionType, ParticipantObject, ParticipantObjectKind, UserIdKind,
    UserType,
};
pub use registry::EventTypeRegistry;
pub use service::{AssembledEvent, AuditService};
pub use spool::{AuditField, AuditInfo, InstanceField, InstanceInfo, SpoolRecord};
pub use transport::{
    AuditTransport, ConsoleTransport, DualTransport, FileTransport, MemoryTransport,
    NullTransport, create_transport,
};
