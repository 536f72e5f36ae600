use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use edc_audit::AuditLog;
use edc_forms::{FormRegistry, validate};
use edc_model::{
    AuditEvent, CoreError, DataPoint, DataPointId, DataPointStatus, EntityRef, EventBus,
    NewDataPoint, Notification, Participant, ParticipantId, Query, QueryId, QueryResponse,
    QueryStatus, Result,
};
use edc_persistence::{EntityLocks, SnapshotStore, keys, load, save};

/// The EDC store.
pub struct EdcStore {
    store: Arc<dyn SnapshotStore>,
    locks: EntityLocks,
    forms: FormRegistry,
    audit: Arc<AuditLog>,
    bus: Arc<dyn EventBus>,
}

impl EdcStore {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        forms: FormRegistry,
        audit: Arc<AuditLog>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            store,
            locks: EntityLocks::new(),
            forms,
            audit,
            bus,
        }
    }

    pub fn forms(&self) -> &FormRegistry {
        &self.forms
    }

    // --- participants ---

    /// Create the owning record and audit scaffold for a participant.
    /// Idempotent per participant id: a second call is a no-op.
    pub fn initialize_participant(&self, participant: &Participant, actor: &str) -> Result<()> {
        let key = keys::participant(&participant.id);
        self.locks.with_entity(&key, || {
            if self.store.get(&key)?.is_some() {
                return Ok(());
            }
            save(self.store.as_ref(), &key, participant)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::participant(&participant.id), actor, "initialized")
                    .with_after(json!({
                        "study_id": participant.study_id,
                        "subject_code": participant.subject_code,
                    })),
            )?;
            info!(participant = %participant.id, study = %participant.study_id, "participant initialized");
            Ok(())
        })
    }

    pub fn get_participant(&self, id: &ParticipantId) -> Result<Participant> {
        load(self.store.as_ref(), &keys::participant(id))?
            .ok_or_else(|| CoreError::not_found("participant", id.as_str()))
    }

    /// Mark a participant archived (study archival cascade).
    pub fn archive_participant(&self, id: &ParticipantId, actor: &str) -> Result<()> {
        let key = keys::participant(id);
        self.locks.with_entity(&key, || {
            let mut participant = self.get_participant(id)?;
            if participant.archived {
                return Ok(());
            }
            participant.archived = true;
            save(self.store.as_ref(), &key, &participant)?;
            self.audit
                .append(&AuditEvent::new(EntityRef::participant(id), actor, "archived"))?;
            Ok(())
        })
    }

    /// Remove a participant snapshot. Compensation path for a failed
    /// enrollment commit only; audit history is never deleted.
    pub fn discard_participant(&self, id: &ParticipantId) -> Result<()> {
        let key = keys::participant(id);
        self.locks.with_entity(&key, || {
            self.store.delete(&key)?;
            Ok(())
        })
    }

    // --- data points ---

    /// Validate and persist a case-report-form submission.
    ///
    /// On validation failure nothing is persisted and the full error list is
    /// returned. On success the entry starts in `Draft` with a `created`
    /// audit entry recording the submitted payload. Resubmitting an id that
    /// is already stored is rejected: the existing entry and its trail stay
    /// untouched, corrections go through [`Self::update_data_point_field`].
    pub fn store_data_point(&self, input: NewDataPoint, actor: &str) -> Result<DataPoint> {
        // Owning participant must exist before anything else.
        let participant = self.get_participant(&input.participant_id)?;

        let outcome = validate(&self.forms, &input.form_id, &input.fields);
        if !outcome.valid {
            warn!(
                participant = %participant.id,
                form = %input.form_id,
                errors = outcome.errors.len(),
                "submission rejected by schema validation"
            );
            return Err(CoreError::Validation {
                errors: outcome.errors,
            });
        }

        let id = input
            .id
            .unwrap_or_else(|| DataPointId::generate(&input.participant_id, &input.form_id));
        let created = AuditEvent::new(EntityRef::data_point(&id), actor, "created")
            .with_after(json!({ "form_id": input.form_id, "fields": input.fields }));
        let data_point = DataPoint {
            id: id.clone(),
            participant_id: input.participant_id,
            visit_number: input.visit_number,
            form_id: input.form_id,
            fields: input.fields,
            status: DataPointStatus::Draft,
            locked: false,
            monitored: false,
            created_at: Utc::now(),
            audit_trail: vec![created.clone()],
        };

        let key = keys::data_point(&id);
        self.locks.with_entity(&key, || -> Result<()> {
            if self.store.get(&key)?.is_some() {
                return Err(CoreError::state_transition(
                    format!("data point {id}"),
                    "an entry with this id already exists; corrections go through field updates",
                ));
            }
            save(self.store.as_ref(), &key, &data_point)?;
            self.audit.append(&created)?;
            Ok(())
        })?;
        info!(data_point = %id, form = %data_point.form_id, "data point captured");
        self.bus.publish(Notification::DataPointCaptured {
            participant_id: data_point.participant_id.clone(),
            data_point_id: id,
            form_id: data_point.form_id.clone(),
        });
        Ok(data_point)
    }

    pub fn get_data_point(&self, id: &DataPointId) -> Result<DataPoint> {
        load(self.store.as_ref(), &keys::data_point(id))?
            .ok_or_else(|| CoreError::not_found("data point", id.as_str()))
    }

    /// All entries captured for one participant.
    pub fn data_points_for(&self, participant: &ParticipantId) -> Result<Vec<DataPoint>> {
        let mut points = Vec::new();
        for key in self.store.list_keys("data_point/")? {
            if let Some(point) = load::<DataPoint>(self.store.as_ref(), &key)?
                && point.participant_id == *participant
            {
                points.push(point);
            }
        }
        Ok(points)
    }

    /// Change one field value. Rejected once the entry is locked; a
    /// verified entry drops back to `Draft` until re-verified.
    pub fn update_data_point_field(
        &self,
        id: &DataPointId,
        field: &str,
        value: Value,
        actor: &str,
    ) -> Result<DataPoint> {
        let key = keys::data_point(id);
        self.locks.with_entity(&key, || {
            let mut point = self.get_data_point(id)?;
            if point.locked {
                return Err(CoreError::state_transition(
                    format!("data point {id}"),
                    "entry is locked; no further field mutation permitted",
                ));
            }
            let before = point.fields.get(field).cloned().unwrap_or(Value::Null);
            let change = AuditEvent::new(EntityRef::data_point(id), actor, "field_changed")
                .with_before(json!({ field: before }))
                .with_after(json!({ field: value.clone() }));
            point.fields.insert(field.to_string(), value);
            point.status = DataPointStatus::Draft;
            point.audit_trail.push(change.clone());
            save(self.store.as_ref(), &key, &point)?;
            self.audit.append(&change)?;
            Ok(point)
        })
    }

    /// Re-validate the entry and mark it verified.
    pub fn verify_data_point(&self, id: &DataPointId, actor: &str) -> Result<DataPoint> {
        let key = keys::data_point(id);
        self.locks.with_entity(&key, || {
            let mut point = self.get_data_point(id)?;
            if point.status == DataPointStatus::Verified {
                return Err(CoreError::state_transition(
                    format!("data point {id}"),
                    "entry is already verified",
                ));
            }
            let outcome = validate(&self.forms, &point.form_id, &point.fields);
            if !outcome.valid {
                return Err(CoreError::Validation {
                    errors: outcome.errors,
                });
            }
            point.status = DataPointStatus::Verified;
            let event = AuditEvent::new(EntityRef::data_point(id), actor, "verified");
            point.audit_trail.push(event.clone());
            save(self.store.as_ref(), &key, &point)?;
            self.audit.append(&event)?;
            Ok(point)
        })
    }

    /// Lock the entry. Terminal: field mutation is rejected afterwards.
    pub fn lock_data_point(&self, id: &DataPointId, actor: &str) -> Result<DataPoint> {
        let key = keys::data_point(id);
        self.locks.with_entity(&key, || {
            let mut point = self.get_data_point(id)?;
            if point.locked {
                return Err(CoreError::state_transition(
                    format!("data point {id}"),
                    "entry is already locked",
                ));
            }
            point.locked = true;
            let event = AuditEvent::new(EntityRef::data_point(id), actor, "locked");
            point.audit_trail.push(event.clone());
            save(self.store.as_ref(), &key, &point)?;
            self.audit.append(&event)?;
            Ok(point)
        })
    }

    /// Flag the entry for monitoring review.
    pub fn mark_monitored(&self, id: &DataPointId, actor: &str) -> Result<DataPoint> {
        let key = keys::data_point(id);
        self.locks.with_entity(&key, || {
            let mut point = self.get_data_point(id)?;
            if point.monitored {
                return Ok(point);
            }
            point.monitored = true;
            let event = AuditEvent::new(EntityRef::data_point(id), actor, "monitored");
            point.audit_trail.push(event.clone());
            save(self.store.as_ref(), &key, &point)?;
            self.audit.append(&event)?;
            Ok(point)
        })
    }

    // --- queries ---

    /// Open a data clarification query against an entry.
    pub fn create_query(
        &self,
        data_point_id: &DataPointId,
        opened_by: &str,
        message: &str,
    ) -> Result<Query> {
        let point = self.get_data_point(data_point_id)?;
        let query = Query {
            id: QueryId::generate(data_point_id),
            data_point_id: data_point_id.clone(),
            participant_id: point.participant_id.clone(),
            opened_by: opened_by.to_string(),
            message: message.to_string(),
            status: QueryStatus::Open,
            responses: Vec::new(),
            opened_at: Utc::now(),
            resolved_at: None,
        };
        let key = keys::query(&query.id);
        self.locks.with_entity(&key, || -> Result<()> {
            save(self.store.as_ref(), &key, &query)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::query(&query.id), opened_by, "opened")
                    .with_after(json!({ "data_point_id": data_point_id, "message": message })),
            )?;
            Ok(())
        })?;
        info!(query = %query.id, data_point = %data_point_id, "query opened");
        self.bus.publish(Notification::DataQualityIssue {
            participant_id: point.participant_id,
            data_point_id: data_point_id.clone(),
            query_id: query.id.clone(),
        });
        Ok(query)
    }

    pub fn get_query(&self, id: &QueryId) -> Result<Query> {
        load(self.store.as_ref(), &keys::query(id))?
            .ok_or_else(|| CoreError::not_found("query", id.as_str()))
    }

    /// Append a response to an open query.
    pub fn respond_to_query(&self, id: &QueryId, responder: &str, message: &str) -> Result<Query> {
        let key = keys::query(id);
        self.locks.with_entity(&key, || {
            let mut query = self.get_query(id)?;
            if query.status == QueryStatus::Resolved {
                return Err(CoreError::state_transition(
                    format!("query {id}"),
                    "query is already resolved",
                ));
            }
            query.responses.push(QueryResponse {
                responder: responder.to_string(),
                message: message.to_string(),
                at: Utc::now(),
            });
            save(self.store.as_ref(), &key, &query)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::query(id), responder, "responded")
                    .with_after(json!({ "message": message })),
            )?;
            Ok(query)
        })
    }

    /// Resolve an open query. Resolving twice is rejected.
    pub fn resolve_query(&self, id: &QueryId, actor: &str) -> Result<Query> {
        let key = keys::query(id);
        self.locks.with_entity(&key, || {
            let mut query = self.get_query(id)?;
            if query.status == QueryStatus::Resolved {
                return Err(CoreError::state_transition(
                    format!("query {id}"),
                    "query is already resolved",
                ));
            }
            query.status = QueryStatus::Resolved;
            query.resolved_at = Some(Utc::now());
            save(self.store.as_ref(), &key, &query)?;
            self.audit
                .append(&AuditEvent::new(EntityRef::query(id), actor, "resolved"))?;
            Ok(query)
        })
    }
}
