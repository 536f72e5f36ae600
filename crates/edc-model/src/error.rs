//! Core error types.
//!
//! Every public operation of the engine returns one of these variants with
//! enough structured detail to render a user-facing message. Validation and
//! state-transition failures are never swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Form or field schema violation. Carries every violated constraint,
    /// never just the first.
    #[error("validation failed with {} error(s): {}", errors.len(), errors.join("; "))]
    Validation { errors: Vec<String> },

    /// Unknown study/participant/document/check/query identifier.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Candidate failed eligibility evaluation. Carries the failing
    /// criterion description.
    #[error("candidate is not eligible: {reason}")]
    Eligibility { reason: String },

    /// Study has reached its enrollment target.
    #[error("study {study_id} has reached its enrollment target of {target}")]
    EnrollmentClosed { study_id: String, target: u32 },

    /// Study is on safety hold; new enrollment is rejected.
    #[error("study {study_id} is on safety hold")]
    StudyOnHold { study_id: String },

    /// Operation not permitted in the entity's current state.
    #[error("invalid state transition for {entity}: {detail}")]
    StateTransition { entity: String, detail: String },

    /// A compliance check predicate itself failed to run. The error-status
    /// result is persisted before this is surfaced.
    #[error("compliance check {check_id} failed to execute: {detail}")]
    ComplianceCheckExecution { check_id: String, detail: String },

    /// Identifier failed format validation.
    #[error("invalid {kind} identifier: {value:?}")]
    InvalidId { kind: &'static str, value: String },

    /// Persistence provider failure.
    #[error("persistence provider failure")]
    Persistence {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Audit trail append failed. Fatal for the enclosing mutation: an
    /// un-audited mutation violates the regulatory guarantee.
    #[error("audit trail write failed for {entity}")]
    AuditWrite {
        entity: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CoreError {
    /// Convenience constructor for state transition rejections.
    pub fn state_transition(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        CoreError::StateTransition {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    /// Convenience constructor for lookup failures.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
