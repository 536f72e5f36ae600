//! Study and adverse event entities.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Causality, SeriousnessCategory, Severity, StudyStatus};
use crate::ids::{AdverseEventId, ParticipantId, StudyId};
use crate::protocol::StudyProtocol;

/// A defined study: protocol, lifecycle status, and owned collections.
///
/// Enrollment membership and the counter live on the same snapshot so that
/// one put commits both; `current_enrollment` is mutated only by successful
/// enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: StudyId,
    pub protocol: StudyProtocol,
    pub status: StudyStatus,
    pub current_enrollment: u32,
    pub participant_ids: Vec<ParticipantId>,
    pub adverse_event_ids: Vec<AdverseEventId>,
    pub created_at: DateTime<Utc>,
    pub archived: bool,
}

impl Study {
    pub fn new(id: StudyId, protocol: StudyProtocol) -> Self {
        Self {
            id,
            protocol,
            status: StudyStatus::Design,
            current_enrollment: 0,
            participant_ids: Vec::new(),
            adverse_event_ids: Vec::new(),
            created_at: Utc::now(),
            archived: false,
        }
    }

    /// Whether the enrollment target has headroom. Lifecycle status is
    /// checked separately by the registry.
    pub fn enrollment_open(&self) -> bool {
        self.current_enrollment < self.protocol.target_enrollment
    }
}

/// Input for recording an adverse event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdverseEventInput {
    pub term: String,
    pub severity: Severity,
    pub causality: Causality,
    #[serde(default)]
    pub seriousness: BTreeSet<SeriousnessCategory>,
    pub onset: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<NaiveDate>,
}

/// A recorded adverse event.
///
/// Immutable once the regulatory report has been dispatched; until then,
/// amendments are permitted and audit-logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdverseEvent {
    pub id: AdverseEventId,
    pub participant_id: ParticipantId,
    pub study_id: StudyId,
    pub term: String,
    pub severity: Severity,
    pub causality: Causality,
    pub seriousness: BTreeSet<SeriousnessCategory>,
    pub onset: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<NaiveDate>,
    pub regulatory_reporting_required: bool,
    pub report_dispatched: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AdverseEvent {
    /// Whether an event with the given gradings must be reported.
    ///
    /// Any seriousness category triggers reporting, as does causality
    /// probable/definite. The causality clause stands in for an
    /// expectedness flag; changing it needs clinical sign-off.
    pub fn reporting_required(
        seriousness: &BTreeSet<SeriousnessCategory>,
        causality: Causality,
    ) -> bool {
        !seriousness.is_empty() || causality.suggests_relation()
    }

    /// True when the event carries at least one seriousness category.
    pub fn is_serious(&self) -> bool {
        !self.seriousness.is_empty()
    }
}
