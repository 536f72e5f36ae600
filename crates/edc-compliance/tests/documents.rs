//! Document version chain and approval workflow tests.

use std::sync::Arc;

use edc_audit::AuditLog;
use edc_compliance::{ComplianceRegistry, VersionBump};
use edc_model::{CoreError, DocumentStatus, EntityRef, NullBus, ReviewOutcome};
use edc_persistence::MemoryStore;

fn registry() -> ComplianceRegistry {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(NullBus);
    let audit = Arc::new(AuditLog::new(store.clone(), bus.clone()));
    ComplianceRegistry::new(store, audit, bus)
}

#[test]
fn upload_starts_at_v1_0_pending_review() {
    let registry = registry();
    let document = registry
        .upload_document("protocol", "sponsor", "s3://docs/protocol-v1.pdf", None, None)
        .unwrap();

    assert_eq!(document.status, DocumentStatus::PendingReview);
    assert_eq!(document.versions.len(), 1);
    assert_eq!(document.current_version().unwrap().number.to_string(), "1.0");
}

#[test]
fn version_chain_advances_and_decisions_reference_the_head() {
    let registry = registry();
    let document = registry
        .upload_document("protocol", "sponsor", "ref-1", None, None)
        .unwrap();

    // 1.0 -> 1.1; approval references 1.1, not 1.0.
    let document = registry
        .add_version(
            &document.id,
            "sponsor",
            "ref-2",
            Some("amended dosing table".to_string()),
            VersionBump::Minor,
            None,
        )
        .unwrap();
    assert_eq!(document.current_version().unwrap().number.to_string(), "1.1");

    let document = registry
        .approve_document(&document.id, "reviewer", None)
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Approved);
    assert_eq!(document.decisions.len(), 1);
    assert_eq!(document.decisions[0].outcome, ReviewOutcome::Approved);
    assert_eq!(document.decisions[0].version.to_string(), "1.1");

    // A further version resets to pending review and yields 1.2; the prior
    // decision is untouched.
    let document = registry
        .add_version(&document.id, "sponsor", "ref-3", None, VersionBump::Minor, None)
        .unwrap();
    assert_eq!(document.current_version().unwrap().number.to_string(), "1.2");
    assert_eq!(document.status, DocumentStatus::PendingReview);
    assert_eq!(document.decisions.len(), 1);
}

#[test]
fn deciding_twice_without_a_new_version_is_rejected() {
    let registry = registry();
    let document = registry
        .upload_document("consent_form", "sponsor", "ref-1", None, None)
        .unwrap();
    registry
        .approve_document(&document.id, "reviewer", None)
        .unwrap();

    let error = registry
        .reject_document(&document.id, "reviewer", None)
        .unwrap_err();
    assert!(matches!(error, CoreError::StateTransition { .. }));
}

#[test]
fn rejection_is_recorded_and_reversible_via_new_version() {
    let registry = registry();
    let document = registry
        .upload_document("irb_approval", "site-crc", "ref-1", None, None)
        .unwrap();

    let document = registry
        .reject_document(&document.id, "reviewer", Some("wrong template".to_string()))
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Rejected);

    let document = registry
        .add_version(&document.id, "site-crc", "ref-2", None, VersionBump::Minor, None)
        .unwrap();
    assert_eq!(document.status, DocumentStatus::PendingReview);
    let document = registry
        .approve_document(&document.id, "reviewer", None)
        .unwrap();
    assert_eq!(document.decisions.len(), 2);
    assert_eq!(document.decisions[0].outcome, ReviewOutcome::Rejected);
    assert_eq!(document.decisions[1].outcome, ReviewOutcome::Approved);
}

#[test]
fn major_bump_reissues_the_document() {
    let registry = registry();
    let document = registry
        .upload_document("protocol", "sponsor", "ref-1", None, None)
        .unwrap();
    let document = registry
        .add_version(&document.id, "sponsor", "ref-2", None, VersionBump::Major, None)
        .unwrap();
    assert_eq!(document.current_version().unwrap().number.to_string(), "2.0");
}

#[test]
fn document_operations_are_audited() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(NullBus);
    let audit = Arc::new(AuditLog::new(store.clone(), bus.clone()));
    let registry = ComplianceRegistry::new(store, audit.clone(), bus);

    let document = registry
        .upload_document("protocol", "sponsor", "ref-1", None, None)
        .unwrap();
    registry
        .add_version(&document.id, "sponsor", "ref-2", None, VersionBump::Minor, None)
        .unwrap();
    registry
        .approve_document(&document.id, "reviewer", None)
        .unwrap();

    let trail = audit
        .events_for(&EntityRef::document(&document.id))
        .unwrap();
    let actions: Vec<_> = trail.iter().map(|event| event.action.as_str()).collect();
    assert_eq!(actions, vec!["uploaded", "version_added", "approved"]);
}
