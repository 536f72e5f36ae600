//! Document version chain and approval workflow.
//!
//! State machine: `pending_review <-> {approved, rejected}`, re-entered via
//! `add_version`, which appends a strictly increasing version and resets the
//! status. Decisions are immutable and always reference the version that
//! was current when the decision was made.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use edc_model::{
    AuditEvent, CoreError, Document, DocumentId, DocumentStatus, DocumentVersion, EntityRef,
    Notification, Result, ReviewDecision, ReviewOutcome, StudyId, VersionNumber,
};
use edc_persistence::{keys, load, save};

use crate::registry::ComplianceRegistry;

/// How `add_version` advances the version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionBump {
    /// Smallest unit increment: 1.0 -> 1.1.
    #[default]
    Minor,
    /// Re-issued document: 1.4 -> 2.0.
    Major,
}

impl ComplianceRegistry {
    /// Register a new document at version 1.0, pending review.
    pub fn upload_document(
        &self,
        doc_type: &str,
        uploaded_by: &str,
        storage_ref: &str,
        comment: Option<String>,
        study_id: Option<StudyId>,
    ) -> Result<Document> {
        let id = DocumentId::generate(doc_type);
        let document = Document {
            id: id.clone(),
            doc_type: doc_type.to_string(),
            status: DocumentStatus::PendingReview,
            versions: vec![DocumentVersion {
                number: VersionNumber::INITIAL,
                uploaded_by: uploaded_by.to_string(),
                uploaded_at: Utc::now(),
                storage_ref: storage_ref.to_string(),
                comment,
            }],
            decisions: Vec::new(),
            study_id,
        };
        let key = keys::document(&id);
        self.locks.with_entity(&key, || -> Result<()> {
            save(self.store.as_ref(), &key, &document)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::document(&id), uploaded_by, "uploaded")
                    .with_after(json!({ "doc_type": doc_type, "version": "1.0" })),
            )?;
            Ok(())
        })?;
        info!(document = %id, doc_type, "document uploaded");
        self.bus
            .publish(Notification::DocumentUploaded { document_id: id });
        Ok(document)
    }

    pub fn get_document(&self, id: &DocumentId) -> Result<Document> {
        load(self.store.as_ref(), &keys::document(id))?
            .ok_or_else(|| CoreError::not_found("document", id.as_str()))
    }

    /// Append a new version to the chain.
    ///
    /// The new number is the head's plus the smallest unit increment (or a
    /// major bump when requested); status resets to pending review unless an
    /// explicit override is given.
    pub fn add_version(
        &self,
        id: &DocumentId,
        uploaded_by: &str,
        storage_ref: &str,
        comment: Option<String>,
        bump: VersionBump,
        status_override: Option<DocumentStatus>,
    ) -> Result<Document> {
        let key = keys::document(id);
        let document = self.locks.with_entity(&key, || -> Result<Document> {
            let mut document = self.get_document(id)?;
            let head = document
                .current_version()
                .map(|version| version.number)
                .unwrap_or(VersionNumber::INITIAL);
            let number = match bump {
                VersionBump::Minor => head.next_minor(),
                VersionBump::Major => head.next_major(),
            };
            let previous_status = document.status;
            document.versions.push(DocumentVersion {
                number,
                uploaded_by: uploaded_by.to_string(),
                uploaded_at: Utc::now(),
                storage_ref: storage_ref.to_string(),
                comment,
            });
            document.status = status_override.unwrap_or(DocumentStatus::PendingReview);
            save(self.store.as_ref(), &key, &document)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::document(id), uploaded_by, "version_added")
                    .with_before(json!({
                        "version": head.to_string(),
                        "status": previous_status,
                    }))
                    .with_after(json!({
                        "version": number.to_string(),
                        "status": document.status,
                    })),
            )?;
            Ok(document)
        })?;
        let number = document
            .current_version()
            .map(|version| version.number)
            .unwrap_or(VersionNumber::INITIAL);
        self.bus.publish(Notification::DocumentVersionAdded {
            document_id: id.clone(),
            version: number,
        });
        Ok(document)
    }

    /// Approve the current version.
    pub fn approve_document(
        &self,
        id: &DocumentId,
        decided_by: &str,
        comment: Option<String>,
    ) -> Result<Document> {
        self.decide(id, decided_by, comment, ReviewOutcome::Approved)
    }

    /// Reject the current version.
    pub fn reject_document(
        &self,
        id: &DocumentId,
        decided_by: &str,
        comment: Option<String>,
    ) -> Result<Document> {
        self.decide(id, decided_by, comment, ReviewOutcome::Rejected)
    }

    fn decide(
        &self,
        id: &DocumentId,
        decided_by: &str,
        comment: Option<String>,
        outcome: ReviewOutcome,
    ) -> Result<Document> {
        let key = keys::document(id);
        let (document, version) = self.locks.with_entity(&key, || {
            let mut document = self.get_document(id)?;
            if document.status != DocumentStatus::PendingReview {
                return Err(CoreError::state_transition(
                    format!("document {id}"),
                    format!(
                        "cannot decide on a document in status {}; add a new version first",
                        document.status
                    ),
                ));
            }
            let version = document
                .current_version()
                .map(|v| v.number)
                .ok_or_else(|| {
                    CoreError::state_transition(
                        format!("document {id}"),
                        "document has no versions",
                    )
                })?;
            document.decisions.push(ReviewDecision {
                outcome,
                version,
                decided_by: decided_by.to_string(),
                decided_at: Utc::now(),
                comment,
            });
            document.status = match outcome {
                ReviewOutcome::Approved => DocumentStatus::Approved,
                ReviewOutcome::Rejected => DocumentStatus::Rejected,
            };
            save(self.store.as_ref(), &key, &document)?;
            let action = match outcome {
                ReviewOutcome::Approved => "approved",
                ReviewOutcome::Rejected => "rejected",
            };
            self.audit.append(
                &AuditEvent::new(EntityRef::document(id), decided_by, action)
                    .with_after(json!({ "version": version.to_string() })),
            )?;
            Ok((document, version))
        })?;
        info!(document = %id, version = %version, outcome = ?outcome, "document decision recorded");
        self.bus.publish(match outcome {
            ReviewOutcome::Approved => Notification::DocumentApproved {
                document_id: id.clone(),
                version,
            },
            ReviewOutcome::Rejected => Notification::DocumentRejected {
                document_id: id.clone(),
                version,
            },
        });
        Ok(document)
    }
}
