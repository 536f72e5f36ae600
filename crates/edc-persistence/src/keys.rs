//! Storage key layout.
//!
//! One namespace per entity kind, `kind/id`. Audit trails live under
//! `audit/` keyed by the subject entity's own key fragment.

use edc_model::{
    AdverseEventId, CheckResultId, DataPointId, DocumentId, EntityRef, ParticipantId, QueryId,
    StudyId,
};

pub fn study(id: &StudyId) -> String {
    format!("study/{id}")
}

pub fn participant(id: &ParticipantId) -> String {
    format!("participant/{id}")
}

pub fn data_point(id: &DataPointId) -> String {
    format!("data_point/{id}")
}

pub fn query(id: &QueryId) -> String {
    format!("query/{id}")
}

pub fn adverse_event(id: &AdverseEventId) -> String {
    format!("adverse_event/{id}")
}

pub fn document(id: &DocumentId) -> String {
    format!("document/{id}")
}

pub fn check_result(id: &CheckResultId) -> String {
    format!("check_result/{id}")
}

pub fn audit_trail(entity: &EntityRef) -> String {
    format!("audit/{}", entity.key())
}

/// Key of the global audit trail spanning all entities.
pub const GLOBAL_AUDIT: &str = "audit/_global";
