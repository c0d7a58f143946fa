//! Event-type registry.
//!
//! Maps the tag supplied by a triggering subsystem to the fixed event id,
//! action code and type codes of that kind of event.

use atna_core::config::{AuditConfig, ConfigError, EventCategory};
use std::collections::BTreeMap;

use crate::event::{CodedValue, EventActionCode, EventType};

pub const CONNECTION_FAILED: &str = "connection-failed";
pub const CONNECTION_REJECTED: &str = "connection-rejected";
pub const CONNECTION_ESTABLISHED: &str = "connection-established";
pub const STUDY_DELETED: &str = "study-deleted";
pub const STUDY_UPDATED: &str = "study-updated";
pub const STUDY_ACCESS_CONTROL_UPDATED: &str = "study-access-control-updated";
pub const STUDY_MOVED_TO_PATIENT: &str = "study-moved-to-patient";
pub const EXPIRATION_DATE_UPDATED: &str = "expiration-date-updated";

/// Registry of known event types, keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct EventTypeRegistry {
    types: BTreeMap<String, EventType>,
}

impl EventTypeRegistry {
    /// Registry with the built-in connection and study-management types.
    pub fn builtin() -> Self {
        let security_alert = CodedValue::dcm("110113", "Security Alert");
        let node_authentication = CodedValue::dcm("110126", "Node Authentication");
        let instances_accessed = CodedValue::dcm("110103", "DICOM Instances Accessed");

        let mut registry = Self::default();
        for tag in [CONNECTION_FAILED, CONNECTION_REJECTED, CONNECTION_ESTABLISHED] {
            registry.register(
                EventType::new(
                    tag,
                    EventCategory::Connection,
                    security_alert.clone(),
                    EventActionCode::Execute,
                )
                .with_type_code(node_authentication.clone()),
            );
        }

        registry.register(EventType::new(
            STUDY_DELETED,
            EventCategory::StudyManagement,
            CodedValue::dcm("110105", "DICOM Study Deleted"),
            EventActionCode::Delete,
        ));
        for tag in [
            STUDY_UPDATED,
            STUDY_ACCESS_CONTROL_UPDATED,
            STUDY_MOVED_TO_PATIENT,
            EXPIRATION_DATE_UPDATED,
        ] {
            registry.register(EventType::new(
                tag,
                EventCategory::StudyManagement,
                instances_accessed.clone(),
                EventActionCode::Update,
            ));
        }
        registry
    }

    /// Built-in types plus the custom types from configuration.
    ///
    /// A custom type with a built-in tag replaces the built-in definition.
    pub fn from_config(config: &AuditConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin();
        for definition in &config.event_types {
            let event_type = EventType::try_from(definition)?;
            if registry.register(event_type).is_some() {
                tracing::info!(tag = %definition.tag, "Built-in event type overridden by configuration");
            }
        }
        Ok(registry)
    }

    /// Add an event type, returning the one it replaced.
    pub fn register(&mut self, event_type: EventType) -> Option<EventType> {
        self.types.insert(event_type.tag.clone(), event_type)
    }

    pub fn get(&self, tag: &str) -> Option<&EventType> {
        self.types.get(tag)
    }

    /// Event types ordered by tag.
    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atna_core::config::{CodeDefinition, EventTypeDefinition};

    fn definition(tag: &str, action: &str) -> EventTypeDefinition {
        EventTypeDefinition {
            tag: tag.to_string(),
            category: EventCategory::StudyManagement,
            event_id: CodeDefinition {
                code: "110110".to_string(),
                scheme: "DCM".to_string(),
                meaning: "Patient Record".to_string(),
            },
            action: action.to_string(),
            type_codes: Vec::new(),
        }
    }

    #[test]
    fn test_builtin_tags() {
        let registry = EventTypeRegistry::builtin();
        assert_eq!(registry.len(), 8);
        for tag in [CONNECTION_FAILED, CONNECTION_REJECTED, CONNECTION_ESTABLISHED] {
            let event_type = registry.get(tag).unwrap();
            assert_eq!(event_type.category, EventCategory::Connection);
            assert_eq!(event_type.type_codes.len(), 1);
        }
        let deleted = registry.get(STUDY_DELETED).unwrap();
        assert_eq!(deleted.action, EventActionCode::Delete);
        assert_eq!(deleted.event_id.code, "110105");
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_iter_is_ordered_by_tag() {
        let registry = EventTypeRegistry::builtin();
        let tags: Vec<&str> = registry.iter().map(|t| t.tag.as_str()).collect();
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn test_from_config_adds_custom_type() {
        let config = AuditConfig {
            event_types: vec![definition("patient-merged", "U")],
            ..Default::default()
        };
        let registry = EventTypeRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 9);
        let merged = registry.get("patient-merged").unwrap();
        assert_eq!(merged.event_id, CodedValue::dcm("110110", "Patient Record"));
        assert_eq!(merged.action, EventActionCode::Update);
    }

    #[test]
    fn test_from_config_overrides_builtin() {
        let config = AuditConfig {
            event_types: vec![definition(STUDY_DELETED, "E")],
            ..Default::default()
        };
        let registry = EventTypeRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry.get(STUDY_DELETED).unwrap().action,
            EventActionCode::Execute
        );
    }

    #[test]
    fn test_from_config_rejects_bad_action() {
        let config = AuditConfig {
            event_types: vec![definition("patient-merged", "merge")],
            ..Default::default()
        };
        let err = EventTypeRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("patient-merged"));
    }
}
