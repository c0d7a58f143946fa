//! Event identification and classification.
//!
//! The caller knows what happened and selects an [`EventType`]; the record
//! only decides the outcome. Classification is pure: no I/O, same inputs give
//! the same identification.

use atna_core::config::{CodeDefinition, ConfigError, EventCategory, EventTypeDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::spool::{AuditField, AuditInfo};

/// A coded value (code, coding scheme, display meaning).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedValue {
    pub code: String,
    pub scheme: String,
    pub meaning: String,
}

impl CodedValue {
    pub fn new(
        code: impl Into<String>,
        scheme: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            scheme: scheme.into(),
            meaning: meaning.into(),
        }
    }

    /// A value from the DICOM controlled terminology.
    pub fn dcm(code: &str, meaning: &str) -> Self {
        Self::new(code, "DCM", meaning)
    }
}

impl From<&CodeDefinition> for CodedValue {
    fn from(def: &CodeDefinition) -> Self {
        Self::new(&def.code, &def.scheme, &def.meaning)
    }
}

impl std::fmt::Display for CodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, \"{}\")", self.code, self.scheme, self.meaning)
    }
}

/// Event action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventActionCode {
    #[serde(rename = "C")]
    Create,
    #[serde(rename = "R")]
    Read,
    #[serde(rename = "U")]
    Update,
    #[serde(rename = "D")]
    Delete,
    #[serde(rename = "E")]
    Execute,
}

impl EventActionCode {
    pub fn code(self) -> &'static str {
        match self {
            Self::Create => "C",
            Self::Read => "R",
            Self::Update => "U",
            Self::Delete => "D",
            Self::Execute => "E",
        }
    }
}

impl FromStr for EventActionCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" => Ok(Self::Create),
            "R" => Ok(Self::Read),
            "U" => Ok(Self::Update),
            "D" => Ok(Self::Delete),
            "E" => Ok(Self::Execute),
            other => Err(format!("unknown event action code: {other}")),
        }
    }
}

/// Event outcome indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventOutcomeIndicator {
    #[serde(rename = "0")]
    Success,
    #[serde(rename = "4")]
    MinorFailure,
    #[serde(rename = "8")]
    SeriousFailure,
    #[serde(rename = "12")]
    MajorFailure,
}

impl EventOutcomeIndicator {
    pub fn code(self) -> &'static str {
        match self {
            Self::Success => "0",
            Self::MinorFailure => "4",
            Self::SeriousFailure => "8",
            Self::MajorFailure => "12",
        }
    }
}

impl std::fmt::Display for EventOutcomeIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::MinorFailure => write!(f, "MINOR_FAILURE"),
            Self::SeriousFailure => write!(f, "SERIOUS_FAILURE"),
            Self::MajorFailure => write!(f, "MAJOR_FAILURE"),
        }
    }
}

/// A kind of audited event: the tag callers use plus its fixed
/// identification triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventType {
    pub tag: String,
    pub category: EventCategory,
    pub event_id: CodedValue,
    pub action: EventActionCode,
    pub type_codes: Vec<CodedValue>,
}

impl EventType {
    pub fn new(
        tag: impl Into<String>,
        category: EventCategory,
        event_id: CodedValue,
        action: EventActionCode,
    ) -> Self {
        Self {
            tag: tag.into(),
            category,
            event_id,
            action,
            type_codes: Vec::new(),
        }
    }

    pub fn with_type_code(mut self, code: CodedValue) -> Self {
        self.type_codes.push(code);
        self
    }
}

impl TryFrom<&EventTypeDefinition> for EventType {
    type Error = ConfigError;

    fn try_from(def: &EventTypeDefinition) -> Result<Self, Self::Error> {
        let action = def.action.parse::<EventActionCode>().map_err(|e| {
            ConfigError::Config(format!("event type '{}': {}", def.tag, e))
        })?;
        Ok(Self {
            tag: def.tag.clone(),
            category: def.category,
            event_id: CodedValue::from(&def.event_id),
            action,
            type_codes: def.type_codes.iter().map(CodedValue::from).collect(),
        })
    }
}

/// Identification block of an audit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventIdentification {
    pub event_id: CodedValue,
    pub action: EventActionCode,
    pub event_date_time: DateTime<Utc>,
    pub outcome: EventOutcomeIndicator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_codes: Vec<CodedValue>,
}

/// Derive the event identification for a decoded record.
///
/// Any outcome value marks the event as a minor failure; finer severities
/// are not derived here.
pub fn classify(
    info: &AuditInfo,
    event_type: &EventType,
    event_time: DateTime<Utc>,
) -> EventIdentification {
    let outcome_description = info.field(AuditField::Outcome).map(str::to_string);
    let outcome = if outcome_description.is_some() {
        EventOutcomeIndicator::MinorFailure
    } else {
        EventOutcomeIndicator::Success
    };

    EventIdentification {
        event_id: event_type.event_id.clone(),
        action: event_type.action,
        event_date_time: event_time,
        outcome,
        outcome_description,
        type_codes: event_type.type_codes.clone(),
    }
}
