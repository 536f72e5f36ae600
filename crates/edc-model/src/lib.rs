pub mod audit;
pub mod document;
pub mod enums;
pub mod error;
pub mod events;
pub mod ids;
pub mod participant;
pub mod protocol;
pub mod study;

pub use audit::{AuditEvent, EntityRef};
pub use document::{
    ComplianceCheckResult, Document, DocumentVersion, ReviewDecision, ReviewOutcome, VersionNumber,
};
pub use enums::{
    Causality, CheckOutcome, CheckSeverity, DataPointStatus, DocumentStatus, QueryStatus,
    SeriousnessCategory, Severity, StudyStatus,
};
pub use error::{CoreError, Result};
pub use events::{
    EventBus, MemoryBus, MemoryDispatcher, Notification, NullBus, NullDispatcher,
    RegulatoryDispatcher,
};
pub use ids::{
    AdverseEventId, AuditEventId, CheckId, CheckResultId, DataPointId, DocumentId, ParticipantId,
    QueryId, StudyId, SubjectCode,
};
pub use participant::{
    Candidate, ConsentRecord, DataPoint, NewDataPoint, Participant, Query, QueryResponse,
    strip_direct_identifiers,
};
pub use protocol::{
    Comparison, Criterion, SafetyConfig, StudyPhase, StudyProtocol, VisitDefinition,
};
pub use study::{AdverseEvent, AdverseEventInput, Study};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_starts_in_design_with_zero_enrollment() {
        let protocol = StudyProtocol {
            title: "Test".to_string(),
            phase: StudyPhase::Phase2,
            primary_endpoints: vec![],
            secondary_endpoints: vec![],
            inclusion_criteria: vec![],
            exclusion_criteria: vec![],
            target_enrollment: 10,
            sites: vec![],
            visits: vec![],
            safety: SafetyConfig::default(),
        };
        let study = Study::new(StudyId::new("S1").unwrap(), protocol);
        assert_eq!(study.status, StudyStatus::Design);
        assert_eq!(study.current_enrollment, 0);
        assert!(study.enrollment_open());
        assert!(!study.archived);
    }
}
