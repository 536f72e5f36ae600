//! Audit trail record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{
    AdverseEventId, AuditEventId, CheckResultId, DataPointId, DocumentId, ParticipantId, QueryId,
    StudyId,
};

/// Reference to the subject entity of an audit event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn study(id: &StudyId) -> Self {
        Self::new("study", id.as_str())
    }

    pub fn participant(id: &ParticipantId) -> Self {
        Self::new("participant", id.as_str())
    }

    pub fn data_point(id: &DataPointId) -> Self {
        Self::new("data_point", id.as_str())
    }

    pub fn query(id: &QueryId) -> Self {
        Self::new("query", id.as_str())
    }

    pub fn adverse_event(id: &AdverseEventId) -> Self {
        Self::new("adverse_event", id.as_str())
    }

    pub fn document(id: &DocumentId) -> Self {
        Self::new("document", id.as_str())
    }

    pub fn check_result(id: &CheckResultId) -> Self {
        Self::new("check_result", id.as_str())
    }

    /// Storage key fragment, stable across kinds.
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, self.id)
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// One immutable audit trail entry.
///
/// Entries are only ever appended. The optional before/after snapshots hold
/// the JSON form of the mutated state; for creation events `before` is
/// absent and `after` carries the full submitted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub entity: EntityRef,
    pub actor: String,
    pub action: String,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

impl AuditEvent {
    pub fn new(entity: EntityRef, actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: AuditEventId::generate(&entity.key()),
            entity,
            actor: actor.into(),
            action: action.into(),
            at: Utc::now(),
            before: None,
            after: None,
        }
    }

    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(before);
        self
    }

    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(after);
        self
    }
}
