//! Participant-owned entities: the participant record, case-report-form
//! entries, and data clarification queries.
//!
//! Demographics stored here must already be anonymized. The engine strips
//! direct identifiers before persistence; see [`strip_direct_identifiers`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::AuditEvent;
use crate::enums::{DataPointStatus, QueryStatus};
use crate::ids::{DataPointId, ParticipantId, QueryId, StudyId, SubjectCode};
use crate::protocol::VisitDefinition;

/// Demographic keys that must never be persisted on a participant.
pub const DIRECT_IDENTIFIER_KEYS: &[&str] = &[
    "name",
    "first_name",
    "last_name",
    "contact",
    "email",
    "phone",
    "address",
    "ssn",
    "mrn",
    "date_of_birth",
];

/// Returns the demographics map with all direct identifier keys removed.
pub fn strip_direct_identifiers(demographics: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    demographics
        .iter()
        .filter(|(key, _)| {
            !DIRECT_IDENTIFIER_KEYS
                .iter()
                .any(|banned| key.eq_ignore_ascii_case(banned))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Candidate data supplied to enrollment, before anonymization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub diagnoses: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    /// Most recent numeric lab results, keyed by test name.
    #[serde(default)]
    pub lab_values: BTreeMap<String, f64>,
    /// Free-form demographics; direct identifiers are stripped at enrollment.
    #[serde(default)]
    pub demographics: BTreeMap<String, Value>,
}

/// Consent captured at enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub version: String,
    pub signed_on: NaiveDate,
}

/// An enrolled participant. Belongs to exactly one study for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub study_id: StudyId,
    pub subject_code: SubjectCode,
    pub enrolled_at: DateTime<Utc>,
    pub consent: ConsentRecord,
    /// Anonymized demographics; direct identifiers already stripped.
    pub demographics: BTreeMap<String, Value>,
    pub visit_schedule: Vec<VisitDefinition>,
    pub archived: bool,
}

/// Input for capturing a case-report-form entry. The identity is assigned
/// by the store when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DataPointId>,
    pub participant_id: ParticipantId,
    pub visit_number: u32,
    pub form_id: String,
    pub fields: BTreeMap<String, Value>,
}

/// One case-report-form entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: DataPointId,
    pub participant_id: ParticipantId,
    pub visit_number: u32,
    pub form_id: String,
    pub fields: BTreeMap<String, Value>,
    pub status: DataPointStatus,
    /// Terminal flag: no field mutation once set.
    pub locked: bool,
    /// Flagged for monitoring review.
    pub monitored: bool,
    pub created_at: DateTime<Utc>,
    /// Entry-scoped trail recording every field-level change, including the
    /// original creation payload. Append-only.
    pub audit_trail: Vec<AuditEvent>,
}

/// Response appended to an open query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub responder: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// A data clarification query against one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub data_point_id: DataPointId,
    pub participant_id: ParticipantId,
    pub opened_by: String,
    pub message: String,
    pub status: QueryStatus,
    pub responses: Vec<QueryResponse>,
    pub opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}
