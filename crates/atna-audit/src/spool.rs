//! Spool record codec.
//!
//! A spool record is written by the triggering subsystem at event time and
//! decoded here, out of band. The format is line oriented UTF-8 text:
//!
//! - line 1 is the primary record line (the main audit info)
//! - every following non-empty line describes one affected instance
//!
//! Fields are positional and separated by a single backslash. An empty field
//! is a logical null; a line shorter than the schema leaves the trailing
//! fields null. Values are kept verbatim, so a primary line holding only
//! whitespace is a valid record whose first field is that whitespace.

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::SpoolCorruptError;

/// Field delimiter inside a spool line.
pub const FIELD_DELIMITER: char = '\\';

/// Positional schema of the primary record line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuditField {
    CallingHost,
    CallingUserId,
    CalledUserId,
    CalledHost,
    ConnType,
    Outcome,
    /// Explicit event time (RFC 3339). Overrides the file timestamp.
    EventTime,
    StudyUid,
    PatientId,
    PatientName,
    AccessionNo,
    ExpirationDate,
}

impl AuditField {
    /// All fields in positional order.
    pub const ALL: [AuditField; 12] = [
        AuditField::CallingHost,
        AuditField::CallingUserId,
        AuditField::CalledUserId,
        AuditField::CalledHost,
        AuditField::ConnType,
        AuditField::Outcome,
        AuditField::EventTime,
        AuditField::StudyUid,
        AuditField::PatientId,
        AuditField::PatientName,
        AuditField::AccessionNo,
        AuditField::ExpirationDate,
    ];

    /// Position of this field within a primary record line.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CallingHost => "CALLING_HOST",
            Self::CallingUserId => "CALLING_USERID",
            Self::CalledUserId => "CALLED_USERID",
            Self::CalledHost => "CALLED_HOST",
            Self::ConnType => "CONN_TYPE",
            Self::Outcome => "OUTCOME",
            Self::EventTime => "EVENT_TIME",
            Self::StudyUid => "STUDY_UID",
            Self::PatientId => "PATIENT_ID",
            Self::PatientName => "PATIENT_NAME",
            Self::AccessionNo => "ACCESSION_NO",
            Self::ExpirationDate => "EXPIRATION_DATE",
        }
    }
}

impl std::fmt::Display for AuditField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Positional schema of an instance line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceField {
    SopClassUid,
    SopInstanceUid,
}

impl InstanceField {
    pub const ALL: [InstanceField; 2] = [InstanceField::SopClassUid, InstanceField::SopInstanceUid];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Decoded primary record line: every schema field, each possibly null.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditInfo {
    fields: Vec<Option<String>>,
}

impl AuditInfo {
    /// Decode one primary record line.
    pub fn parse_line(line: &str) -> Self {
        Self {
            fields: split_fields(line, AuditField::ALL.len()),
        }
    }

    /// Build audit info from explicit field values; all other fields are null.
    pub fn from_fields<'a>(values: impl IntoIterator<Item = (AuditField, &'a str)>) -> Self {
        let mut fields = vec![None; AuditField::ALL.len()];
        for (field, value) in values {
            fields[field.index()] = Some(value.to_string());
        }
        Self { fields }
    }

    /// Value of a field, `None` when absent.
    pub fn field(&self, field: AuditField) -> Option<&str> {
        self.fields.get(field.index()).and_then(|v| v.as_deref())
    }

    /// Encode back into a primary record line.
    ///
    /// Trailing null fields are dropped, so `parse_line(encode())` round-trips.
    pub fn encode(&self) -> String {
        encode_fields(&self.fields)
    }
}

/// Decoded instance line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    fields: Vec<Option<String>>,
}

impl InstanceInfo {
    pub fn parse_line(line: &str) -> Self {
        Self {
            fields: split_fields(line, InstanceField::ALL.len()),
        }
    }

    pub fn field(&self, field: InstanceField) -> Option<&str> {
        self.fields.get(field.index()).and_then(|v| v.as_deref())
    }
}

/// A fully decoded spool record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolRecord {
    /// Primary record line.
    pub main: AuditInfo,
    /// One entry per instance line.
    pub instances: Vec<InstanceInfo>,
    /// Timestamp persisted by the storage layer.
    pub stored_at: DateTime<Utc>,
    /// Nominal event time: the explicit `EVENT_TIME` field if it parses,
    /// otherwise `stored_at`.
    pub event_time: DateTime<Utc>,
}

/// Decode the spool file at `path`.
///
/// The file is only read, never modified or locked, so decoding the same file
/// twice yields equal records. Reads go through `tokio::fs`, so a caller's
/// timeout can abandon a read that never completes.
pub async fn decode(path: impl AsRef<Path>) -> Result<SpoolRecord, SpoolCorruptError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SpoolCorruptError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let content = String::from_utf8(bytes).map_err(|_| SpoolCorruptError::InvalidEncoding {
        path: path.to_path_buf(),
    })?;

    let stored_at = file_timestamp(path).await;
    decode_str(&content, stored_at).ok_or_else(|| SpoolCorruptError::MissingPrimaryLine {
        path: path.to_path_buf(),
    })
}

/// Decode spool content already held in memory.
///
/// Returns `None` when the primary record line is absent or empty.
pub fn decode_str(content: &str, stored_at: DateTime<Utc>) -> Option<SpoolRecord> {
    let mut lines = content.lines();
    let primary = lines.next().filter(|line| !line.is_empty())?;

    let main = AuditInfo::parse_line(primary);
    let instances = lines
        .filter(|line| !line.trim().is_empty())
        .map(InstanceInfo::parse_line)
        .collect();
    let event_time = resolve_event_time(&main, stored_at);

    Some(SpoolRecord {
        main,
        instances,
        stored_at,
        event_time,
    })
}

fn resolve_event_time(main: &AuditInfo, stored_at: DateTime<Utc>) -> DateTime<Utc> {
    let Some(explicit) = main.field(AuditField::EventTime) else {
        return stored_at;
    };
    match DateTime::parse_from_rfc3339(explicit) {
        Ok(time) => time.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(
                event_time = explicit,
                error = %e,
                "Unparseable EVENT_TIME in spool record, using file timestamp"
            );
            stored_at
        }
    }
}

/// File modification time, falling back to creation time.
async fn file_timestamp(path: &Path) -> DateTime<Utc> {
    let time = tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified().or_else(|_| m.created()));
    match time {
        Ok(time) => DateTime::<Utc>::from(time),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Spool file has no usable timestamp, using current time"
            );
            Utc::now()
        }
    }
}

fn split_fields(line: &str, schema_len: usize) -> Vec<Option<String>> {
    let mut fields: Vec<Option<String>> = line
        .split(FIELD_DELIMITER)
        .take(schema_len)
        .map(|value| (!value.is_empty()).then(|| value.to_string()))
        .collect();
    fields.resize(schema_len, None);
    fields
}

fn encode_fields(fields: &[Option<String>]) -> String {
    let used = fields
        .iter()
        .rposition(Option::is_some)
        .map_or(0, |last| last + 1);
    fields[..used]
        .iter()
        .map(|v| v.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(FIELD_DELIMITER.to_string().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_full_connection_line() {
        let info = AuditInfo::parse_line(r"10.0.0.1\ARCHIVE1\PEER1\10.0.0.9\FAILED");
        assert_eq!(info.field(AuditField::CallingHost), Some("10.0.0.1"));
        assert_eq!(info.field(AuditField::CallingUserId), Some("ARCHIVE1"));
        assert_eq!(info.field(AuditField::CalledUserId), Some("PEER1"));
        assert_eq!(info.field(AuditField::CalledHost), Some("10.0.0.9"));
        assert_eq!(info.field(AuditField::ConnType), Some("FAILED"));
        assert_eq!(info.field(AuditField::Outcome), None);
    }

    #[test]
    fn test_short_line_yields_nulls() {
        let info = AuditInfo::parse_line("host-a");
        assert_eq!(info.field(AuditField::CallingHost), Some("host-a"));
        for field in &AuditField::ALL[1..] {
            assert_eq!(info.field(*field), None, "{field} should be null");
        }
    }

    #[test]
    fn test_empty_fields_are_null_and_values_verbatim() {
        let info = AuditInfo::parse_line(r" spaced \\PEER1\\ACCEPTED\Association aborted ");
        assert_eq!(info.field(AuditField::CallingHost), Some(" spaced "));
        assert_eq!(info.field(AuditField::CallingUserId), None);
        assert_eq!(info.field(AuditField::CalledHost), None);
        assert_eq!(
            info.field(AuditField::Outcome),
            Some("Association aborted ")
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        let line = format!("{}\\extra\\more", "a\\".repeat(AuditField::ALL.len() - 1) + "a");
        let info = AuditInfo::parse_line(&line);
        assert_eq!(info.field(AuditField::ExpirationDate), Some("a"));
    }

    #[test]
    fn test_encode_trims_trailing_nulls() {
        let info = AuditInfo::from_fields([
            (AuditField::CallingHost, "10.0.0.1"),
            (AuditField::CalledUserId, "PEER1"),
        ]);
        assert_eq!(info.encode(), r"10.0.0.1\\PEER1");
        assert_eq!(AuditInfo::parse_line(&info.encode()), info);
    }

    #[test]
    fn test_decode_str_with_instances() {
        let content = "\\RESTUSER\\ARCHIVE\r\n1.2.840.10008.5.1.4.1.1.2\\1.2.3.4\r\n\r\n1.2.840.10008.5.1.4.1.1.2\\1.2.3.5\n";
        let record = decode_str(content, ts()).unwrap();
        assert_eq!(record.main.field(AuditField::CallingUserId), Some("RESTUSER"));
        assert_eq!(record.instances.len(), 2);
        assert_eq!(
            record.instances[1].field(InstanceField::SopInstanceUid),
            Some("1.2.3.5")
        );
    }

    #[test]
    fn test_decode_str_missing_primary_line() {
        assert!(decode_str("", ts()).is_none());
        assert!(decode_str("\n1.2\\3.4\n", ts()).is_none());
    }

    #[test]
    fn test_explicit_event_time_wins() {
        let info = AuditInfo::from_fields([(AuditField::EventTime, "2023-12-24T18:30:00+01:00")]);
        let record = decode_str(&info.encode(), ts()).unwrap();
        assert_eq!(record.event_time.to_rfc3339(), "2023-12-24T17:30:00+00:00");
        assert_eq!(record.stored_at, ts());
    }

    #[test]
    fn test_unparseable_event_time_falls_back() {
        let info = AuditInfo::from_fields([(AuditField::EventTime, "yesterday")]);
        let record = decode_str(&info.encode(), ts()).unwrap();
        assert_eq!(record.event_time, ts());
    }

    #[test]
    fn test_whitespace_primary_line_is_kept_verbatim() {
        let record = decode_str(" \n1.2\\3.4\n", ts()).unwrap();
        assert_eq!(record.main.field(AuditField::CallingHost), Some(" "));
        assert_eq!(record.main.field(AuditField::CallingUserId), None);
        assert_eq!(record.instances.len(), 1);
    }

    #[tokio::test]
    async fn test_decode_file_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r"10.0.0.1\ARCHIVE1\PEER1\10.0.0.9\FAILED").unwrap();

        let first = decode(file.path()).await.unwrap();
        let second = decode(file.path()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.event_time, first.stored_at);
        assert!(file.path().exists());
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let err = decode("/nonexistent/spool/record").await.unwrap_err();
        assert!(matches!(err, SpoolCorruptError::Unreadable { .. }));
        assert_eq!(err.path(), Path::new("/nonexistent/spool/record"));
    }

    #[tokio::test]
    async fn test_decode_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = decode(file.path()).await.unwrap_err();
        assert!(matches!(err, SpoolCorruptError::MissingPrimaryLine { .. }));
    }

    #[tokio::test]
    async fn test_decode_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, b'\\', 0x80]).unwrap();
        let err = decode(file.path()).await.unwrap_err();
        assert!(matches!(err, SpoolCorruptError::InvalidEncoding { .. }));
    }
}
