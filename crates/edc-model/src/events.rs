//! Outbound collaborator interfaces and notification payloads.
//!
//! The engine never awaits a response from these collaborators: the event
//! bus and the regulatory dispatcher are fire-and-forget, so core
//! success/failure semantics never depend on downstream availability.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::audit::EntityRef;
use crate::document::VersionNumber;
use crate::enums::CheckOutcome;
use crate::ids::{AdverseEventId, CheckId, DataPointId, DocumentId, ParticipantId, QueryId, StudyId};
use crate::study::{AdverseEvent, Study};

/// Notification emitted to the event bus for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    StudyDefined {
        study_id: StudyId,
    },
    ParticipantEnrolled {
        study_id: StudyId,
        participant_id: ParticipantId,
    },
    DataPointCaptured {
        participant_id: ParticipantId,
        data_point_id: DataPointId,
        form_id: String,
    },
    DataQualityIssue {
        participant_id: ParticipantId,
        data_point_id: DataPointId,
        query_id: QueryId,
    },
    AdverseEventRecorded {
        study_id: StudyId,
        participant_id: ParticipantId,
        adverse_event_id: AdverseEventId,
        regulatory_reporting_required: bool,
    },
    SafetyHold {
        study_id: StudyId,
    },
    DocumentUploaded {
        document_id: DocumentId,
    },
    DocumentVersionAdded {
        document_id: DocumentId,
        version: VersionNumber,
    },
    DocumentApproved {
        document_id: DocumentId,
        version: VersionNumber,
    },
    DocumentRejected {
        document_id: DocumentId,
        version: VersionNumber,
    },
    ComplianceCheckCompleted {
        check_id: CheckId,
        outcome: CheckOutcome,
    },
    AuditEventRecorded {
        entity: EntityRef,
    },
}

/// Notification/event bus. Publishing never blocks the operation outcome.
pub trait EventBus: Send + Sync {
    fn publish(&self, notification: Notification);
}

/// Bus that drops everything. Default for embedders without consumers.
#[derive(Debug, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&self, _notification: Notification) {}
}

/// Bus that records notifications in memory, for tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryBus {
    events: Mutex<Vec<Notification>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EventBus for MemoryBus {
    fn publish(&self, notification: Notification) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

/// Regulatory reporting dispatcher, notified when an adverse event requires
/// reporting. Failures are the dispatcher's concern, never retried here.
pub trait RegulatoryDispatcher: Send + Sync {
    fn dispatch(&self, event: &AdverseEvent, study: &Study);
}

/// Dispatcher that drops reports. Default for embedders wiring their own.
#[derive(Debug, Default)]
pub struct NullDispatcher;

impl RegulatoryDispatcher for NullDispatcher {
    fn dispatch(&self, _event: &AdverseEvent, _study: &Study) {}
}

/// Dispatcher that records dispatched event ids, for tests.
#[derive(Debug, Default)]
pub struct MemoryDispatcher {
    dispatched: Mutex<Vec<AdverseEventId>>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<AdverseEventId> {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl RegulatoryDispatcher for MemoryDispatcher {
    fn dispatch(&self, event: &AdverseEvent, _study: &Study) {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.id.clone());
    }
}
