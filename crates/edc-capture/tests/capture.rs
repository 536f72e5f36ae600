//! EDC store integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use edc_audit::AuditLog;
use edc_capture::EdcStore;
use edc_forms::FormRegistry;
use edc_model::{
    ConsentRecord, CoreError, DataPointStatus, EntityRef, MemoryBus, NewDataPoint, Notification,
    Participant, ParticipantId, QueryStatus, StudyId, SubjectCode,
};
use edc_persistence::{MemoryStore, SnapshotStore};
use serde_json::{Value, json};

struct Fixture {
    store: Arc<MemoryStore>,
    audit: Arc<AuditLog>,
    bus: Arc<MemoryBus>,
    edc: EdcStore,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(MemoryBus::new());
    let audit = Arc::new(AuditLog::new(store.clone(), bus.clone()));
    let edc = EdcStore::new(
        store.clone(),
        FormRegistry::builtin(),
        audit.clone(),
        bus.clone(),
    );
    Fixture {
        store,
        audit,
        bus,
        edc,
    }
}

fn participant(id: &str) -> Participant {
    let study_id = StudyId::new("S1").unwrap();
    Participant {
        id: ParticipantId::new(id).unwrap(),
        study_id: study_id.clone(),
        subject_code: SubjectCode::derive(&study_id, 1, Utc::now()),
        enrolled_at: Utc::now(),
        consent: ConsentRecord {
            version: "2.0".to_string(),
            signed_on: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        },
        demographics: BTreeMap::new(),
        visit_schedule: vec![],
        archived: false,
    }
}

fn vital_signs_fields() -> BTreeMap<String, Value> {
    [
        ("measurement_date", json!("2026-03-14")),
        ("heart_rate", json!(85)),
        ("systolic_bp", json!(120)),
        ("diastolic_bp", json!(80)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn submission(participant_id: &ParticipantId) -> NewDataPoint {
    NewDataPoint {
        id: None,
        participant_id: participant_id.clone(),
        visit_number: 1,
        form_id: "vital_signs".to_string(),
        fields: vital_signs_fields(),
    }
}

#[test]
fn initialize_participant_is_idempotent() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();
    fx.edc.initialize_participant(&subject, "crc").unwrap();

    // One audit entry, not two: the second call was a no-op.
    let trail = fx
        .audit
        .events_for(&EntityRef::participant(&subject.id))
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, "initialized");
}

#[test]
fn invalid_submission_persists_nothing() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();

    fx.bus.drain();

    let mut bad = submission(&subject.id);
    bad.fields.remove("heart_rate");
    let error = fx.edc.store_data_point(bad, "crc").unwrap_err();

    match error {
        CoreError::Validation { errors } => {
            assert_eq!(errors, vec!["Missing required field: heart_rate".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(fx.store.list_keys("data_point/").unwrap().is_empty());
    assert!(fx.bus.snapshot().is_empty());
}

#[test]
fn valid_submission_is_captured_as_draft_with_creation_audit() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();

    let point = fx.edc.store_data_point(submission(&subject.id), "crc").unwrap();
    assert_eq!(point.status, DataPointStatus::Draft);
    assert!(!point.locked);

    // Entry-scoped trail starts with the creation payload.
    assert_eq!(point.audit_trail.len(), 1);
    assert_eq!(point.audit_trail[0].action, "created");
    let payload = point.audit_trail[0].after.as_ref().unwrap();
    assert_eq!(payload["form_id"], json!("vital_signs"));
    assert_eq!(payload["fields"]["heart_rate"], json!(85));

    // Store-level trail got exactly one entry too.
    let trail = fx.audit.events_for(&EntityRef::data_point(&point.id)).unwrap();
    assert_eq!(trail.len(), 1);

    assert!(matches!(
        fx.bus.snapshot().last(),
        Some(Notification::DataPointCaptured { .. })
    ));
}

#[test]
fn resubmission_under_an_existing_id_is_rejected() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();
    let point = fx.edc.store_data_point(submission(&subject.id), "crc").unwrap();
    fx.edc
        .update_data_point_field(&point.id, "heart_rate", json!(90), "crc")
        .unwrap();

    let mut replay = submission(&subject.id);
    replay.id = Some(point.id.clone());
    let error = fx.edc.store_data_point(replay, "crc").unwrap_err();
    assert!(matches!(error, CoreError::StateTransition { .. }));

    // The stored entry kept its fields and its full two-entry trail.
    let kept = fx.edc.get_data_point(&point.id).unwrap();
    assert_eq!(kept.fields["heart_rate"], json!(90));
    assert_eq!(kept.audit_trail.len(), 2);
    assert_eq!(kept.audit_trail[1].action, "field_changed");
}

#[test]
fn unknown_participant_is_rejected() {
    let fx = fixture();
    let missing = ParticipantId::new("P404").unwrap();
    let error = fx.edc.store_data_point(submission(&missing), "crc").unwrap_err();
    assert!(matches!(error, CoreError::NotFound { .. }));
}

#[test]
fn field_update_audits_before_and_after_and_unverifies() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();
    let point = fx.edc.store_data_point(submission(&subject.id), "crc").unwrap();

    let verified = fx.edc.verify_data_point(&point.id, "monitor").unwrap();
    assert_eq!(verified.status, DataPointStatus::Verified);

    let updated = fx
        .edc
        .update_data_point_field(&point.id, "heart_rate", json!(90), "crc")
        .unwrap();
    assert_eq!(updated.status, DataPointStatus::Draft);
    assert_eq!(updated.fields["heart_rate"], json!(90));

    let change = updated.audit_trail.last().unwrap();
    assert_eq!(change.action, "field_changed");
    assert_eq!(change.before.as_ref().unwrap()["heart_rate"], json!(85));
    assert_eq!(change.after.as_ref().unwrap()["heart_rate"], json!(90));
}

#[test]
fn locked_entry_rejects_field_mutation() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();
    let point = fx.edc.store_data_point(submission(&subject.id), "crc").unwrap();

    fx.edc.lock_data_point(&point.id, "monitor").unwrap();
    let error = fx
        .edc
        .update_data_point_field(&point.id, "heart_rate", json!(90), "crc")
        .unwrap_err();
    assert!(matches!(error, CoreError::StateTransition { .. }));

    // Locking twice is also a state error.
    let error = fx.edc.lock_data_point(&point.id, "monitor").unwrap_err();
    assert!(matches!(error, CoreError::StateTransition { .. }));
}

#[test]
fn query_lifecycle_open_respond_resolve() {
    let fx = fixture();
    let subject = participant("P1");
    fx.edc.initialize_participant(&subject, "crc").unwrap();
    let point = fx.edc.store_data_point(submission(&subject.id), "crc").unwrap();

    let query = fx
        .edc
        .create_query(&point.id, "monitor", "Heart rate looks transposed")
        .unwrap();
    assert_eq!(query.status, QueryStatus::Open);
    assert!(matches!(
        fx.bus.snapshot().last(),
        Some(Notification::DataQualityIssue { .. })
    ));

    let query = fx
        .edc
        .respond_to_query(&query.id, "crc", "Confirmed against source")
        .unwrap();
    assert_eq!(query.responses.len(), 1);

    let query = fx.edc.resolve_query(&query.id, "monitor").unwrap();
    assert_eq!(query.status, QueryStatus::Resolved);
    assert!(query.resolved_at.is_some());

    // Resolved is terminal for both responses and re-resolution.
    assert!(matches!(
        fx.edc.respond_to_query(&query.id, "crc", "late").unwrap_err(),
        CoreError::StateTransition { .. }
    ));
    assert!(matches!(
        fx.edc.resolve_query(&query.id, "monitor").unwrap_err(),
        CoreError::StateTransition { .. }
    ));
}

#[test]
fn data_points_for_filters_by_participant() {
    let fx = fixture();
    let first = participant("P1");
    let second = participant("P2");
    fx.edc.initialize_participant(&first, "crc").unwrap();
    fx.edc.initialize_participant(&second, "crc").unwrap();

    fx.edc.store_data_point(submission(&first.id), "crc").unwrap();
    fx.edc.store_data_point(submission(&first.id), "crc").unwrap();
    fx.edc.store_data_point(submission(&second.id), "crc").unwrap();

    assert_eq!(fx.edc.data_points_for(&first.id).unwrap().len(), 2);
    assert_eq!(fx.edc.data_points_for(&second.id).unwrap().len(), 1);
}
