//! Audit engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the audit engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit messages are assembled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Alternative user id stamped on the local archive participant.
    /// Defaults to the id of the running process.
    #[serde(default)]
    pub process_id: Option<String>,

    /// Additional event types on top of the built-in ones.
    #[serde(default)]
    pub event_types: Vec<EventTypeDefinition>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            process_id: None,
            event_types: Vec::new(),
        }
    }
}

/// Participant rules applied to an event type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Network connection events (association established / failed / rejected).
    #[default]
    Connection,
    /// Study and patient management operations.
    StudyManagement,
}

/// A coded value as it appears in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeDefinition {
    pub code: String,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub meaning: String,
}

/// A custom event type: tag plus the fixed identification triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTypeDefinition {
    /// Tag callers use to select this event type.
    pub tag: String,

    #[serde(default)]
    pub category: EventCategory,

    pub event_id: CodeDefinition,

    /// Event action code: C, R, U, D or E.
    pub action: String,

    #[serde(default)]
    pub type_codes: Vec<CodeDefinition>,
}

fn default_enabled() -> bool {
    true
}

fn default_scheme() -> String {
    "DCM".to_string()
}
