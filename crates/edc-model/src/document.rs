//! Regulatory document and compliance result entities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{CheckOutcome, CheckSeverity, DocumentStatus};
use crate::ids::{CheckId, CheckResultId, DocumentId, ParticipantId, StudyId};

/// Document version number, `major.minor`.
///
/// Versions in a chain strictly increase; the smallest increment is one
/// minor step (1.0 -> 1.1). Rendered and stored as a `"major.minor"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const INITIAL: Self = Self { major: 1, minor: 0 };

    pub fn next_minor(self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }

    pub fn next_major(self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("invalid version number: {s:?}"))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid version number: {s:?}"))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid version number: {s:?}"))?;
        Ok(Self { major, minor })
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry in a document's version chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub number: VersionNumber,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    /// Opaque reference into the document storage collaborator.
    pub storage_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Outcome of a review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

/// An immutable approval/rejection decision.
///
/// Always references the version that was current when the decision was
/// made; later versions never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub outcome: ReviewOutcome,
    pub version: VersionNumber,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A regulatory document with its version chain and decision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub doc_type: String,
    pub status: DocumentStatus,
    /// Ordered version chain; the head is the current version.
    pub versions: Vec<DocumentVersion>,
    /// Decision history, append-only.
    pub decisions: Vec<ReviewDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_id: Option<StudyId>,
}

impl Document {
    /// The head of the version chain. A document always carries at least
    /// the version it was uploaded with.
    pub fn current_version(&self) -> Option<&DocumentVersion> {
        self.versions.last()
    }
}

/// A recorded compliance check result. Immutable once recorded;
/// corrections require a new result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheckResult {
    pub id: CheckResultId,
    pub check_id: CheckId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_id: Option<StudyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<ParticipantId>,
    pub executed_at: DateTime<Utc>,
    pub outcome: CheckOutcome,
    pub severity: CheckSeverity,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_increments() {
        let v = VersionNumber::INITIAL;
        assert_eq!(v.to_string(), "1.0");
        assert_eq!(v.next_minor().to_string(), "1.1");
        assert_eq!(v.next_minor().next_major().to_string(), "2.0");
        assert!(v.next_minor() > v);
    }

    #[test]
    fn version_round_trips_as_string() {
        let v: VersionNumber = "2.3".parse().unwrap();
        assert_eq!(v, VersionNumber { major: 2, minor: 3 });
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"2.3\"");
        let back: VersionNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn version_parse_rejects_garbage() {
        assert!("1".parse::<VersionNumber>().is_err());
        assert!("a.b".parse::<VersionNumber>().is_err());
    }
}
