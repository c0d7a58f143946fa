//! Audit message assembly and emission.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AuditDispatchError;
use crate::event::EventIdentification;
use crate::participant::{ActiveParticipant, ParticipantObject};
use crate::transport::AuditTransport;

/// A finished audit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMessage {
    /// Unique message ID.
    pub message_id: Uuid,

    pub event: EventIdentification,

    /// Requestors are conventionally listed first.
    pub active_participants: Vec<ActiveParticipant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant_objects: Vec<ParticipantObject>,
}

impl AuditMessage {
    pub fn new(
        event: EventIdentification,
        active_participants: Vec<ActiveParticipant>,
        participant_objects: Vec<ParticipantObject>,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            event,
            active_participants,
            participant_objects,
        }
    }

    /// Participants flagged as having initiated the event.
    pub fn requestors(&self) -> impl Iterator<Item = &ActiveParticipant> {
        self.active_participants
            .iter()
            .filter(|p| p.user_is_requestor)
    }

    /// Format the message as a human-readable log line.
    ///
    /// Format: `[timestamp] EVENT_ID/ACTION outcome=... requestor=... [participants=...]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {}/{} outcome={}",
            self.event.event_date_time.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event.event_id.code,
            self.event.action.code(),
            self.event.outcome,
        );

        if let Some(ref description) = self.event.outcome_description {
            line.push_str(&format!(" reason=\"{}\"", description.replace('"', "'")));
        }

        let participants: Vec<String> = self
            .active_participants
            .iter()
            .map(|p| {
                format!(
                    "{}{}@{}",
                    if p.user_is_requestor { "*" } else { "" },
                    p.user_id.as_deref().unwrap_or("-"),
                    p.network_access_point_id.as_deref().unwrap_or("-"),
                )
            })
            .collect();
        if !participants.is_empty() {
            line.push_str(&format!(" participants=[{}]", participants.join(",")));
        }

        for object in &self.participant_objects {
            line.push_str(&format!(
                " {:?}={}",
                object.kind,
                object.id.as_deref().unwrap_or("-")
            ));
        }

        line
    }
}

/// Composes audit messages and hands them to the injected transport.
#[derive(Clone)]
pub struct AuditEmitter {
    transport: Arc<dyn AuditTransport>,
}

impl AuditEmitter {
    pub fn new(transport: Arc<dyn AuditTransport>) -> Self {
        Self { transport }
    }

    /// Assemble and send one message.
    ///
    /// Transport errors are returned unchanged; retry or drop is the caller's
    /// decision.
    pub async fn emit(
        &self,
        event: EventIdentification,
        active_participants: Vec<ActiveParticipant>,
        participant_objects: Vec<ParticipantObject>,
    ) -> Result<AuditMessage, AuditDispatchError> {
        let message = AuditMessage::new(event, active_participants, participant_objects);

        tracing::debug!(
            message_id = %message.message_id,
            event_id = %message.event.event_id.code,
            action = message.event.action.code(),
            outcome = %message.event.outcome,
            participants = message.active_participants.len(),
            "Audit message"
        );

        self.transport.send(&message).await?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CodedValue, EventActionCode, EventOutcomeIndicator};
    use crate::participant::{ParticipantObjectKind, UserIdKind};
    use crate::transport::MemoryTransport;
    use async_trait::async_trait;
    use chrono::Utc;

    struct RefusingTransport;

    #[async_trait]
    impl AuditTransport for RefusingTransport {
        async fn send(&self, _message: &AuditMessage) -> Result<(), AuditDispatchError> {
            Err(AuditDispatchError::Rejected("repository unavailable".to_string()))
        }
    }

    fn identification(outcome: Option<&str>) -> EventIdentification {
        EventIdentification {
            event_id: CodedValue::dcm("110105", "DICOM Study Deleted"),
            action: EventActionCode::Delete,
            event_date_time: Utc::now(),
            outcome: if outcome.is_some() {
                EventOutcomeIndicator::MinorFailure
            } else {
                EventOutcomeIndicator::Success
            },
            outcome_description: outcome.map(str::to_string),
            type_codes: Vec::new(),
        }
    }

    fn participants() -> Vec<ActiveParticipant> {
        vec![
            ActiveParticipant::new(Some("admin"), UserIdKind::NodeId, Some("10.1.1.1")).requestor(),
            ActiveParticipant::new(Some("ARCHIVE"), UserIdKind::ApplicationName, Some("arc"))
                .with_alternative_user_id("99"),
        ]
    }

    #[tokio::test]
    async fn test_emit_sends_to_transport() {
        let transport = Arc::new(MemoryTransport::new());
        let emitter = AuditEmitter::new(transport.clone());

        let message = emitter
            .emit(identification(None), participants(), Vec::new())
            .await
            .unwrap();

        let sent = transport.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], message);
        assert_eq!(message.requestors().count(), 1);
    }

    #[tokio::test]
    async fn test_emit_propagates_transport_errors() {
        let emitter = AuditEmitter::new(Arc::new(RefusingTransport));
        let err = emitter
            .emit(identification(None), participants(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditDispatchError::Rejected(_)));
    }

    #[test]
    fn test_to_log_line() {
        let message = AuditMessage::new(
            identification(Some("Study is not empty")),
            participants(),
            vec![ParticipantObject {
                kind: ParticipantObjectKind::Study,
                id: Some("1.2.3".to_string()),
                name: None,
                instance_count: Some(3),
            }],
        );

        let line = message.to_log_line();
        assert!(line.contains("110105/D"));
        assert!(line.contains("outcome=MINOR_FAILURE"));
        assert!(line.contains("reason=\"Study is not empty\""));
        assert!(line.contains("participants=[*admin@10.1.1.1,ARCHIVE@arc]"));
        assert!(line.contains("Study=1.2.3"));
    }

    #[test]
    fn test_message_json_shape() {
        let message = AuditMessage::new(identification(None), participants(), Vec::new());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["event"]["outcome"], "0");
        assert_eq!(json["event"]["action"], "D");
        assert!(json["event"].get("outcome_description").is_none());
        assert!(json.get("participant_objects").is_none());
        assert_eq!(json["active_participants"][0]["user_is_requestor"], true);
        assert_eq!(json["active_participants"][0]["network_access_point_kind"], "2");
        assert_eq!(json["active_participants"][1]["alternative_user_id"], "99");
    }
}
