//! Property tests for the enrollment counter invariant.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use edc_audit::AuditLog;
use edc_capture::EdcStore;
use edc_compliance::ComplianceRegistry;
use edc_forms::FormRegistry;
use edc_model::{
    Candidate, ConsentRecord, Criterion, SafetyConfig, StudyId, StudyPhase, StudyProtocol,
};
use edc_persistence::MemoryStore;
use edc_registry::StudyRegistry;
use proptest::prelude::*;

fn registry() -> StudyRegistry {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(edc_model::NullBus);
    let audit = Arc::new(AuditLog::new(store.clone(), bus.clone()));
    let edc = Arc::new(EdcStore::new(
        store.clone(),
        FormRegistry::builtin(),
        audit.clone(),
        bus.clone(),
    ));
    let compliance = Arc::new(ComplianceRegistry::new(
        store.clone(),
        audit.clone(),
        bus.clone(),
    ));
    StudyRegistry::new(
        store,
        edc,
        compliance,
        audit,
        bus,
        Arc::new(edc_model::NullDispatcher),
    )
}

fn protocol(target: u32) -> StudyProtocol {
    StudyProtocol {
        title: "Property".to_string(),
        phase: StudyPhase::Phase1,
        primary_endpoints: vec![],
        secondary_endpoints: vec![],
        inclusion_criteria: vec![Criterion::AgeRange {
            min: 18,
            max: 65,
            description: None,
        }],
        exclusion_criteria: vec![],
        target_enrollment: target,
        sites: vec![],
        visits: vec![],
        safety: SafetyConfig::default(),
    }
}

fn candidate(age: u32) -> Candidate {
    Candidate {
        age: Some(age),
        diagnoses: vec![],
        medications: vec![],
        lab_values: BTreeMap::new(),
        demographics: BTreeMap::new(),
    }
}

proptest! {
    // The counter equals the number of accepted enrollments and never
    // exceeds the target, whatever mix of eligible and ineligible
    // candidates arrives and in whatever order.
    #[test]
    fn counter_tracks_accepted_enrollments(
        target in 1u32..6,
        ages in prop::collection::vec(1u32..90, 0..12),
    ) {
        let registry = registry();
        let study_id = StudyId::new("PROP-1").unwrap();
        registry.define_study(study_id.clone(), protocol(target)).unwrap();
        registry.activate_study(&study_id, "sponsor").unwrap();

        let consent = ConsentRecord {
            version: "1.0".to_string(),
            signed_on: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };
        let mut accepted = 0u32;
        for age in ages {
            if registry
                .enroll_participant(&study_id, &candidate(age), consent.clone(), "crc")
                .is_ok()
            {
                accepted += 1;
            }
        }

        let study = registry.get_study(&study_id).unwrap();
        prop_assert_eq!(study.current_enrollment, accepted);
        prop_assert!(study.current_enrollment <= study.protocol.target_enrollment);
        prop_assert_eq!(study.participant_ids.len() as u32, accepted);
    }
}
