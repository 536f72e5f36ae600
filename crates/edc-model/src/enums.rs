//! Type-safe enumerations for trial lifecycle and safety concepts.
//!
//! These enums cover the closed vocabularies of the capture engine: study
//! and entry lifecycle states, adverse event gradings, and the regulatory
//! seriousness categories (ICH E2A).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a study.
///
/// Permitted transitions:
/// `Design -> Active -> {SafetyHold, Closed}`, `SafetyHold -> {Active, Closed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyStatus {
    /// Protocol drafted, enrollment not yet open.
    Design,
    /// Enrolling and capturing data.
    Active,
    /// Enrollment suspended by the safety stopping rule or a DSMB action.
    SafetyHold,
    /// No further enrollment or amendment; data retained.
    Closed,
}

impl StudyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyStatus::Design => "design",
            StudyStatus::Active => "active",
            StudyStatus::SafetyHold => "safety_hold",
            StudyStatus::Closed => "closed",
        }
    }

    /// Whether a transition to `to` is allowed by the study state machine.
    pub fn can_transition(self, to: StudyStatus) -> bool {
        use StudyStatus as S;
        matches!(
            (self, to),
            (S::Design, S::Active)
                | (S::Active, S::SafetyHold)
                | (S::Active, S::Closed)
                | (S::SafetyHold, S::Active)
                | (S::SafetyHold, S::Closed)
        )
    }
}

impl fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a case-report-form entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPointStatus {
    /// Captured but not yet source-verified.
    Draft,
    /// Passed schema validation and marked verified.
    Verified,
}

/// Lifecycle state of a data clarification query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Open,
    Resolved,
}

/// Clinical severity grading of an adverse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Investigator-assessed causality of an adverse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Causality {
    Unrelated,
    Unlikely,
    Possible,
    Probable,
    Definite,
}

impl Causality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Causality::Unrelated => "unrelated",
            Causality::Unlikely => "unlikely",
            Causality::Possible => "possible",
            Causality::Probable => "probable",
            Causality::Definite => "definite",
        }
    }

    /// True for the gradings that count toward regulatory reporting.
    pub fn suggests_relation(self) -> bool {
        matches!(self, Causality::Probable | Causality::Definite)
    }
}

impl fmt::Display for Causality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regulatory seriousness categories per ICH E2A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriousnessCategory {
    Death,
    LifeThreatening,
    Hospitalization,
    Disability,
    CongenitalAnomaly,
    MedicallyImportant,
}

impl SeriousnessCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriousnessCategory::Death => "death",
            SeriousnessCategory::LifeThreatening => "life_threatening",
            SeriousnessCategory::Hospitalization => "hospitalization",
            SeriousnessCategory::Disability => "disability",
            SeriousnessCategory::CongenitalAnomaly => "congenital_anomaly",
            SeriousnessCategory::MedicallyImportant => "medically_important",
        }
    }
}

impl fmt::Display for SeriousnessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a regulatory document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::PendingReview => "pending_review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity assigned to a compliance check definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSeverity {
    Critical,
    Major,
    Minor,
}

impl CheckSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckSeverity::Critical => "critical",
            CheckSeverity::Major => "major",
            CheckSeverity::Minor => "minor",
        }
    }
}

impl fmt::Display for CheckSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one compliance check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Fail,
    /// The check predicate itself failed to run; see the result detail.
    Error,
}

impl CheckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::Pass => "pass",
            CheckOutcome::Fail => "fail",
            CheckOutcome::Error => "error",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_status_transition_table() {
        assert!(StudyStatus::Design.can_transition(StudyStatus::Active));
        assert!(StudyStatus::Active.can_transition(StudyStatus::SafetyHold));
        assert!(StudyStatus::Active.can_transition(StudyStatus::Closed));
        assert!(StudyStatus::SafetyHold.can_transition(StudyStatus::Active));
        assert!(StudyStatus::SafetyHold.can_transition(StudyStatus::Closed));

        assert!(!StudyStatus::Design.can_transition(StudyStatus::Closed));
        assert!(!StudyStatus::Closed.can_transition(StudyStatus::Active));
        assert!(!StudyStatus::Design.can_transition(StudyStatus::SafetyHold));
    }

    #[test]
    fn causality_relation_boundary() {
        assert!(!Causality::Possible.suggests_relation());
        assert!(Causality::Probable.suggests_relation());
        assert!(Causality::Definite.suggests_relation());
    }
}
