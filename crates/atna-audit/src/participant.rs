//! Participant role assignment.
//!
//! Builds the active participants of an audit message from a decoded spool
//! record. Which party is flagged as requestor depends on the event category
//! and, for connection events, on the connection type recorded at event time.
//!
//! Missing identity fields never abort assembly: the participant is built with
//! a null identifier instead.

use atna_core::config::EventCategory;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::network::{NetworkAccessPointKind, classify_host};
use crate::spool::{AuditField, AuditInfo, SpoolRecord};

/// How a participant's user id should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIdKind {
    /// Application entity or device name.
    ApplicationName,
    /// Network node id.
    NodeId,
}

/// Kind of participant. Everything audited here is an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Application,
}

/// One actor involved in an audited event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveParticipant {
    pub user_id: Option<String>,
    pub user_id_kind: UserIdKind,
    pub user_type: UserType,
    /// Local process id; only set on the local archive actor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_user_id: Option<String>,
    pub network_access_point_id: Option<String>,
    pub network_access_point_kind: NetworkAccessPointKind,
    pub user_is_requestor: bool,
}

impl ActiveParticipant {
    /// A non-requesting participant located at `host`.
    pub fn new(user_id: Option<&str>, user_id_kind: UserIdKind, host: Option<&str>) -> Self {
        Self {
            user_id: user_id.map(str::to_string),
            user_id_kind,
            user_type: UserType::Application,
            alternative_user_id: None,
            network_access_point_id: host.map(str::to_string),
            network_access_point_kind: classify_host(host),
            user_is_requestor: false,
        }
    }

    /// Mark this participant as the one that initiated the exchange.
    pub fn requestor(mut self) -> Self {
        self.user_is_requestor = true;
        self
    }

    pub fn with_alternative_user_id(mut self, id: impl Into<String>) -> Self {
        self.alternative_user_id = Some(id.into());
        self
    }
}

/// Connection type recorded by the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    Established,
    Failed,
    Rejected,
    RejectedBlacklisted,
    Accepted,
    Closed,
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ESTABLISHED" => Ok(Self::Established),
            "FAILED" => Ok(Self::Failed),
            "REJECTED" => Ok(Self::Rejected),
            "REJECTED_BLACKLISTED" => Ok(Self::RejectedBlacklisted),
            "ACCEPTED" => Ok(Self::Accepted),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("unknown connection type: {s}")),
        }
    }
}

/// Read the connection type of a record.
///
/// `None` when the field is missing or unrecognised.
pub fn connection_type(info: &AuditInfo) -> Option<ConnectionType> {
    let raw = info.field(AuditField::ConnType)?;
    match raw.parse::<ConnectionType>() {
        Ok(conn_type) => Some(conn_type),
        Err(e) => {
            tracing::warn!(conn_type = raw, error = %e, "Unrecognised CONN_TYPE in spool record");
            None
        }
    }
}

/// Participants of a connection event.
///
/// A failed attempt is an outbound one: the local archive (calling side) is
/// the requestor and the unreachable peer is the target. For every other
/// connection type, including a missing or unknown one, the calling side is a
/// remote requestor and the called side is the local archive.
///
/// The calling-side participant carries the local process id in both
/// branches; in the non-failed branch the archive carries it as well.
pub fn connection_participants(info: &AuditInfo, process_id: &str) -> Vec<ActiveParticipant> {
    let calling_user = info.field(AuditField::CallingUserId);
    let calling_host = info.field(AuditField::CallingHost);
    let called_user = info.field(AuditField::CalledUserId);
    let called_host = info.field(AuditField::CalledHost);

    if connection_type(info) == Some(ConnectionType::Failed) {
        let archive_requestor =
            ActiveParticipant::new(calling_user, UserIdKind::ApplicationName, calling_host)
                .with_alternative_user_id(process_id)
                .requestor();
        let remote = ActiveParticipant::new(called_user, UserIdKind::ApplicationName, called_host);
        return vec![archive_requestor, remote];
    }

    let remote_requestor = ActiveParticipant::new(calling_user, UserIdKind::NodeId, calling_host)
        .with_alternative_user_id(process_id)
        .requestor();
    let archive = ActiveParticipant::new(called_user, UserIdKind::ApplicationName, called_host)
        .with_alternative_user_id(process_id);
    vec![remote_requestor, archive]
}

/// Participants of a study-management event: the user or system that called
/// the management API, and the archive that carried out the change.
pub fn study_participants(info: &AuditInfo, process_id: &str) -> Vec<ActiveParticipant> {
    let requestor = ActiveParticipant::new(
        info.field(AuditField::CallingUserId),
        UserIdKind::NodeId,
        info.field(AuditField::CallingHost),
    )
    .requestor();
    let archive = ActiveParticipant::new(
        info.field(AuditField::CalledUserId),
        UserIdKind::ApplicationName,
        info.field(AuditField::CalledHost),
    )
    .with_alternative_user_id(process_id);
    vec![requestor, archive]
}

/// Participants for any event category.
pub fn assign_participants(
    category: EventCategory,
    info: &AuditInfo,
    process_id: &str,
) -> Vec<ActiveParticipant> {
    match category {
        EventCategory::Connection => connection_participants(info, process_id),
        EventCategory::StudyManagement => study_participants(info, process_id),
    }
}

/// Kind of data object touched by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantObjectKind {
    Study,
    Patient,
}

/// A study or patient touched by a study-management event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantObject {
    pub kind: ParticipantObjectKind,
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Number of instances affected, when the record lists them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<usize>,
}

/// Participant objects for a record. Connection events have none.
pub fn participant_objects(category: EventCategory, record: &SpoolRecord) -> Vec<ParticipantObject> {
    if category != EventCategory::StudyManagement {
        return Vec::new();
    }

    let info = &record.main;
    let mut objects = vec![ParticipantObject {
        kind: ParticipantObjectKind::Study,
        id: info.field(AuditField::StudyUid).map(str::to_string),
        name: None,
        instance_count: (!record.instances.is_empty()).then_some(record.instances.len()),
    }];

    if let Some(patient_id) = info.field(AuditField::PatientId) {
        objects.push(ParticipantObject {
            kind: ParticipantObjectKind::Patient,
            id: Some(patient_id.to_string()),
            name: info.field(AuditField::PatientName).map(str::to_string),
            instance_count: None,
        });
    }
    objects
}
