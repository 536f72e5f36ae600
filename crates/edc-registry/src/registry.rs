use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use edc_audit::AuditLog;
use edc_capture::EdcStore;
use edc_compliance::ComplianceRegistry;
use edc_model::{
    AdverseEvent, AdverseEventId, AdverseEventInput, AuditEvent, Candidate, Causality,
    ComplianceCheckResult, ConsentRecord, CoreError, EntityRef, EventBus, Notification,
    Participant, ParticipantId, RegulatoryDispatcher, Result, SeriousnessCategory, Severity,
    Study, StudyId, StudyProtocol, StudyStatus, SubjectCode, strip_direct_identifiers,
};
use edc_persistence::{EntityLocks, SnapshotStore, keys, load, save};

use crate::enrollment::generate_visit_schedule;
use crate::safety::{ProtocolThresholds, SafetyProfile, StoppingRule};

/// Amendment to a recorded adverse event. Absent fields are unchanged.
#[derive(Debug, Clone, Default)]
pub struct AdverseEventUpdate {
    pub severity: Option<Severity>,
    pub causality: Option<Causality>,
    pub seriousness: Option<std::collections::BTreeSet<SeriousnessCategory>>,
    pub resolution: Option<chrono::NaiveDate>,
}

/// The study registry: the engine's public entry point.
///
/// Delegates to the EDC store, the eligibility evaluator, and the document
/// & compliance registry; everything writes through the audit log.
pub struct StudyRegistry {
    store: Arc<dyn SnapshotStore>,
    locks: EntityLocks,
    audit: Arc<AuditLog>,
    edc: Arc<EdcStore>,
    compliance: Arc<ComplianceRegistry>,
    bus: Arc<dyn EventBus>,
    regulatory: Arc<dyn RegulatoryDispatcher>,
    stopping_rule: Box<dyn StoppingRule>,
}

impl StudyRegistry {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        edc: Arc<EdcStore>,
        compliance: Arc<ComplianceRegistry>,
        audit: Arc<AuditLog>,
        bus: Arc<dyn EventBus>,
        regulatory: Arc<dyn RegulatoryDispatcher>,
    ) -> Self {
        Self {
            store,
            locks: EntityLocks::new(),
            audit,
            edc,
            compliance,
            bus,
            regulatory,
            stopping_rule: Box::new(ProtocolThresholds),
        }
    }

    /// Replace the default protocol-threshold stopping rule.
    pub fn with_stopping_rule(mut self, rule: Box<dyn StoppingRule>) -> Self {
        self.stopping_rule = rule;
        self
    }

    pub fn edc(&self) -> &EdcStore {
        &self.edc
    }

    pub fn compliance(&self) -> &ComplianceRegistry {
        &self.compliance
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    // --- study lifecycle ---

    /// Construct a study in `Design` status with zero enrollment and run
    /// the baseline compliance checks.
    pub fn define_study(&self, id: StudyId, protocol: StudyProtocol) -> Result<Study> {
        let key = keys::study(&id);
        let study = self.locks.with_entity(&key, || {
            if self.store.get(&key)?.is_some() {
                return Err(CoreError::state_transition(
                    format!("study {id}"),
                    "study is already defined",
                ));
            }
            let study = Study::new(id.clone(), protocol);
            save(self.store.as_ref(), &key, &study)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::study(&id), "sponsor", "defined").with_after(json!({
                    "title": study.protocol.title,
                    "phase": study.protocol.phase,
                    "target_enrollment": study.protocol.target_enrollment,
                })),
            )?;
            Ok(study)
        })?;
        // Baseline compliance tracking; results are recorded, not gating.
        self.compliance
            .run_all_compliance_checks(Some(&study), None)?;
        info!(study = %study.id, title = %study.protocol.title, "study defined");
        self.bus.publish(Notification::StudyDefined {
            study_id: study.id.clone(),
        });
        Ok(study)
    }

    pub fn get_study(&self, id: &StudyId) -> Result<Study> {
        load(self.store.as_ref(), &keys::study(id))?
            .ok_or_else(|| CoreError::not_found("study", id.as_str()))
    }

    /// `Design -> Active`: open the study for enrollment.
    pub fn activate_study(&self, id: &StudyId, actor: &str) -> Result<Study> {
        self.transition(id, StudyStatus::Active, actor, "activated")
    }

    /// Authorized override lifting a safety hold: `SafetyHold -> Active`.
    pub fn resume_study(&self, id: &StudyId, actor: &str) -> Result<Study> {
        let study = self.get_study(id)?;
        if study.status != StudyStatus::SafetyHold {
            return Err(CoreError::state_transition(
                format!("study {id}"),
                format!("cannot resume from status {}", study.status),
            ));
        }
        self.transition(id, StudyStatus::Active, actor, "resumed")
    }

    pub fn close_study(&self, id: &StudyId, actor: &str) -> Result<Study> {
        self.transition(id, StudyStatus::Closed, actor, "closed")
    }

    fn transition(
        &self,
        id: &StudyId,
        to: StudyStatus,
        actor: &str,
        action: &str,
    ) -> Result<Study> {
        let key = keys::study(id);
        self.locks.with_entity(&key, || {
            let mut study = self.get_study(id)?;
            let from = study.status;
            if !from.can_transition(to) {
                return Err(CoreError::state_transition(
                    format!("study {id}"),
                    format!("{from} -> {to} is not a permitted transition"),
                ));
            }
            study.status = to;
            save(self.store.as_ref(), &key, &study)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::study(id), actor, action)
                    .with_before(json!(from))
                    .with_after(json!(to)),
            )?;
            info!(study = %id, %from, %to, "study status changed");
            Ok(study)
        })
    }

    /// Archive a closed study, cascading to its participants. The study
    /// record is retained; nothing in the audit history is deleted.
    pub fn archive_study(&self, id: &StudyId, actor: &str) -> Result<Study> {
        let key = keys::study(id);
        let study = self.locks.with_entity(&key, || {
            let mut study = self.get_study(id)?;
            if study.status != StudyStatus::Closed {
                return Err(CoreError::state_transition(
                    format!("study {id}"),
                    format!("only closed studies can be archived (status: {})", study.status),
                ));
            }
            if study.archived {
                return Ok(study);
            }
            study.archived = true;
            save(self.store.as_ref(), &key, &study)?;
            self.audit
                .append(&AuditEvent::new(EntityRef::study(id), actor, "archived"))?;
            Ok(study)
        })?;
        for participant_id in &study.participant_ids {
            self.edc.archive_participant(participant_id, actor)?;
        }
        info!(study = %id, participants = study.participant_ids.len(), "study archived");
        Ok(study)
    }

    // --- enrollment ---

    /// Screen and enroll a candidate.
    ///
    /// The enrollment counter and the participant set travel on the study
    /// snapshot, so one put commits both; a failed commit discards the
    /// freshly written participant record.
    pub fn enroll_participant(
        &self,
        study_id: &StudyId,
        candidate: &Candidate,
        consent: ConsentRecord,
        actor: &str,
    ) -> Result<Participant> {
        let key = keys::study(study_id);
        let participant = self.locks.with_entity(&key, || {
            let mut study = self.get_study(study_id)?;
            match study.status {
                StudyStatus::Active => {}
                StudyStatus::SafetyHold => {
                    return Err(CoreError::StudyOnHold {
                        study_id: study_id.as_str().to_string(),
                    });
                }
                StudyStatus::Design | StudyStatus::Closed => {
                    return Err(CoreError::state_transition(
                        format!("study {study_id}"),
                        format!("enrollment is not open in status {}", study.status),
                    ));
                }
            }
            if !study.enrollment_open() {
                return Err(CoreError::EnrollmentClosed {
                    study_id: study_id.as_str().to_string(),
                    target: study.protocol.target_enrollment,
                });
            }

            let evaluation = edc_eligibility::evaluate(&study.protocol, candidate);
            if !evaluation.eligible {
                let reason = evaluation
                    .reason
                    .unwrap_or_else(|| "criterion not met".to_string());
                warn!(study = %study_id, %reason, "candidate rejected");
                return Err(CoreError::Eligibility { reason });
            }

            let ordinal = study.current_enrollment + 1;
            let enrolled_at = Utc::now();
            let participant = Participant {
                id: ParticipantId::generate(study_id, ordinal),
                study_id: study_id.clone(),
                subject_code: SubjectCode::derive(study_id, ordinal, enrolled_at),
                enrolled_at,
                consent,
                demographics: strip_direct_identifiers(&candidate.demographics),
                visit_schedule: generate_visit_schedule(&study.protocol),
                archived: false,
            };
            self.edc.initialize_participant(&participant, actor)?;

            study.current_enrollment = ordinal;
            study.participant_ids.push(participant.id.clone());
            if let Err(error) = save(self.store.as_ref(), &key, &study) {
                // Commit failed: the counter was never published, so the
                // participant record must go too.
                let _ = self.edc.discard_participant(&participant.id);
                return Err(error.into());
            }
            self.audit.append(
                &AuditEvent::new(EntityRef::study(study_id), actor, "participant_enrolled")
                    .with_after(json!({
                        "participant_id": participant.id,
                        "current_enrollment": study.current_enrollment,
                    })),
            )?;
            Ok(participant)
        })?;
        info!(study = %study_id, participant = %participant.id, "participant enrolled");
        self.bus.publish(Notification::ParticipantEnrolled {
            study_id: study_id.clone(),
            participant_id: participant.id.clone(),
        });
        Ok(participant)
    }

    // --- adverse events & safety monitoring ---

    /// Record an adverse event, dispatch regulatory reporting when
    /// required, and re-evaluate the stopping rule inline.
    pub fn record_adverse_event(
        &self,
        participant_id: &ParticipantId,
        input: AdverseEventInput,
        actor: &str,
    ) -> Result<AdverseEvent> {
        let participant = self.edc.get_participant(participant_id)?;
        let study_key = keys::study(&participant.study_id);

        let (event, study, held) = self.locks.with_entity(&study_key, || -> Result<(AdverseEvent, Study, bool)> {
            let mut study = self.get_study(&participant.study_id)?;
            let reporting_required =
                AdverseEvent::reporting_required(&input.seriousness, input.causality);
            let mut event = AdverseEvent {
                id: AdverseEventId::generate(participant_id),
                participant_id: participant_id.clone(),
                study_id: study.id.clone(),
                term: input.term,
                severity: input.severity,
                causality: input.causality,
                seriousness: input.seriousness,
                onset: input.onset,
                resolution: input.resolution,
                regulatory_reporting_required: reporting_required,
                report_dispatched: false,
                recorded_at: Utc::now(),
            };
            let event_key = keys::adverse_event(&event.id);
            save(self.store.as_ref(), &event_key, &event)?;

            study.adverse_event_ids.push(event.id.clone());
            save(self.store.as_ref(), &study_key, &study)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::adverse_event(&event.id), actor, "recorded")
                    .with_after(json!({
                        "term": event.term,
                        "severity": event.severity,
                        "causality": event.causality,
                        "seriousness": event.seriousness,
                        "regulatory_reporting_required": reporting_required,
                    })),
            )?;

            if reporting_required {
                // Fire-and-forget: dispatcher failures are its own concern.
                self.regulatory.dispatch(&event, &study);
                event.report_dispatched = true;
                save(self.store.as_ref(), &event_key, &event)?;
                self.audit.append(&AuditEvent::new(
                    EntityRef::adverse_event(&event.id),
                    actor,
                    "report_dispatched",
                ))?;
            }

            let profile = self.collect_safety_profile(&study)?;
            let mut held = false;
            if study.status == StudyStatus::Active
                && self.stopping_rule.should_hold(&study, &profile)
            {
                study.status = StudyStatus::SafetyHold;
                save(self.store.as_ref(), &study_key, &study)?;
                self.audit.append(
                    &AuditEvent::new(EntityRef::study(&study.id), "system", "safety_hold")
                        .with_before(json!(StudyStatus::Active))
                        .with_after(json!(StudyStatus::SafetyHold)),
                )?;
                warn!(study = %study.id, ?profile, "stopping rule triggered; study on safety hold");
                held = true;
            }
            Ok((event, study, held))
        })?;

        self.bus.publish(Notification::AdverseEventRecorded {
            study_id: study.id.clone(),
            participant_id: participant_id.clone(),
            adverse_event_id: event.id.clone(),
            regulatory_reporting_required: event.regulatory_reporting_required,
        });
        if held {
            self.bus.publish(Notification::SafetyHold {
                study_id: study.id,
            });
        }
        Ok(event)
    }

    pub fn get_adverse_event(&self, id: &AdverseEventId) -> Result<AdverseEvent> {
        load(self.store.as_ref(), &keys::adverse_event(id))?
            .ok_or_else(|| CoreError::not_found("adverse event", id.as_str()))
    }

    /// Amend a recorded adverse event. Rejected once the regulatory report
    /// has been dispatched; every change is audit-logged.
    pub fn amend_adverse_event(
        &self,
        id: &AdverseEventId,
        update: AdverseEventUpdate,
        actor: &str,
    ) -> Result<AdverseEvent> {
        let key = keys::adverse_event(id);
        self.locks.with_entity(&key, || {
            let mut event = self.get_adverse_event(id)?;
            if event.report_dispatched {
                return Err(CoreError::state_transition(
                    format!("adverse event {id}"),
                    "event is immutable once regulatory reporting has been dispatched",
                ));
            }
            let before = json!({
                "severity": event.severity,
                "causality": event.causality,
                "seriousness": event.seriousness,
                "resolution": event.resolution,
            });
            if let Some(severity) = update.severity {
                event.severity = severity;
            }
            if let Some(causality) = update.causality {
                event.causality = causality;
            }
            if let Some(seriousness) = update.seriousness {
                event.seriousness = seriousness;
            }
            if let Some(resolution) = update.resolution {
                event.resolution = Some(resolution);
            }
            event.regulatory_reporting_required =
                AdverseEvent::reporting_required(&event.seriousness, event.causality);
            let after = json!({
                "severity": event.severity,
                "causality": event.causality,
                "seriousness": event.seriousness,
                "resolution": event.resolution,
            });
            save(self.store.as_ref(), &key, &event)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::adverse_event(id), actor, "amended")
                    .with_before(before)
                    .with_after(after),
            )?;

            // An amendment can newly require reporting.
            if event.regulatory_reporting_required && !event.report_dispatched {
                let study = self.get_study(&event.study_id)?;
                self.regulatory.dispatch(&event, &study);
                event.report_dispatched = true;
                save(self.store.as_ref(), &key, &event)?;
                self.audit.append(&AuditEvent::new(
                    EntityRef::adverse_event(id),
                    actor,
                    "report_dispatched",
                ))?;
            }
            Ok(event)
        })
    }

    /// Current aggregate safety profile for a study.
    pub fn safety_profile(&self, study_id: &StudyId) -> Result<SafetyProfile> {
        let study = self.get_study(study_id)?;
        self.collect_safety_profile(&study)
    }

    fn collect_safety_profile(&self, study: &Study) -> Result<SafetyProfile> {
        let mut events = Vec::with_capacity(study.adverse_event_ids.len());
        for id in &study.adverse_event_ids {
            events.push(self.get_adverse_event(id)?);
        }
        Ok(SafetyProfile::from_events(&events))
    }

    /// Compliance results helper: run every registered check against the
    /// study's current state.
    pub fn run_study_compliance(&self, study_id: &StudyId) -> Result<Vec<ComplianceCheckResult>> {
        let study = self.get_study(study_id)?;
        self.compliance.run_all_compliance_checks(Some(&study), None)
    }
}
