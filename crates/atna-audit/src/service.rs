//! Audit service: spool record in, audit message out.
//!
//! Decode, classify, assign participants, emit. Each call reads only its own
//! spool file and shares nothing mutable with other calls, so one service can
//! be used by many concurrent workers.

use atna_core::AuditConfig;
use std::path::Path;
use std::sync::Arc;

use crate::emitter::{AuditEmitter, AuditMessage};
use crate::error::AuditError;
use crate::event::{EventIdentification, EventType, classify};
use crate::participant::{ActiveParticipant, ParticipantObject, assign_participants, participant_objects};
use crate::spool::{SpoolRecord, decode};
use crate::transport::AuditTransport;

/// Everything needed to emit a message for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledEvent {
    pub event: EventIdentification,
    pub active_participants: Vec<ActiveParticipant>,
    pub participant_objects: Vec<ParticipantObject>,
}

/// The audit event assembly engine.
#[derive(Clone)]
pub struct AuditService {
    emitter: AuditEmitter,
    process_id: String,
}

impl AuditService {
    /// Create a service from configuration and an injected transport.
    ///
    /// The alternative user id of local participants is `audit.process_id`
    /// when configured, otherwise the id of the running process.
    pub fn new(config: &AuditConfig, transport: Arc<dyn AuditTransport>) -> Self {
        let process_id = config
            .process_id
            .clone()
            .unwrap_or_else(|| std::process::id().to_string());
        Self::with_process_id(transport, process_id)
    }

    /// Create a service with an explicit local process identity.
    pub fn with_process_id(transport: Arc<dyn AuditTransport>, process_id: impl Into<String>) -> Self {
        Self {
            emitter: AuditEmitter::new(transport),
            process_id: process_id.into(),
        }
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Build identification, participants and objects for a decoded record.
    ///
    /// Pure: performs no I/O.
    pub fn assemble(&self, record: &SpoolRecord, event_type: &EventType) -> AssembledEvent {
        AssembledEvent {
            event: classify(&record.main, event_type, record.event_time),
            active_participants: assign_participants(
                event_type.category,
                &record.main,
                &self.process_id,
            ),
            participant_objects: participant_objects(event_type.category, record),
        }
    }

    /// Audit the spool record at `path` as an event of `event_type`.
    ///
    /// Nothing is sent if the record cannot be decoded. The file is never
    /// modified or deleted.
    pub async fn audit(
        &self,
        path: impl AsRef<Path>,
        event_type: &EventType,
    ) -> Result<AuditMessage, AuditError> {
        let path = path.as_ref();
        let record = decode(path).await?;
        let assembled = self.assemble(&record, event_type);

        tracing::debug!(
            path = %path.display(),
            event_type = %event_type.tag,
            outcome = %assembled.event.outcome,
            "Assembled audit event"
        );

        let message = self
            .emitter
            .emit(
                assembled.event,
                assembled.active_participants,
                assembled.participant_objects,
            )
            .await?;
        Ok(message)
    }
}
