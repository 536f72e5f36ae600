use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Declares a validated string identifier newtype.
///
/// Identifiers are trimmed and must be non-empty; everything else about the
/// format is left to the caller (site conventions vary).
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::InvalidId {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a defined study.
    StudyId,
    "study"
);
entity_id!(
    /// Identifier of an enrolled participant.
    ParticipantId,
    "participant"
);
entity_id!(
    /// Identifier of a case-report-form entry.
    DataPointId,
    "data point"
);
entity_id!(
    /// Identifier of a data clarification query.
    QueryId,
    "query"
);
entity_id!(
    /// Identifier of an adverse event record.
    AdverseEventId,
    "adverse event"
);
entity_id!(
    /// Identifier of a regulatory document.
    DocumentId,
    "document"
);
entity_id!(
    /// Identifier of a registered compliance check definition.
    CheckId,
    "compliance check"
);
entity_id!(
    /// Identifier of a recorded compliance check result.
    CheckResultId,
    "compliance check result"
);
entity_id!(
    /// Identifier of an audit trail entry.
    AuditEventId,
    "audit event"
);

static ID_NONCE: AtomicU64 = AtomicU64::new(0);

/// Short hex digest over the given parts, the current time, and a
/// process-local nonce.
///
/// The timestamp separates processes sharing one durable store; the nonce
/// separates calls landing within one timer tick (same participant
/// submitting the same form twice).
fn short_digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let now = chrono::Utc::now();
    hasher.update(
        now.timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp())
            .to_be_bytes(),
    );
    hasher.update(ID_NONCE.fetch_add(1, Ordering::Relaxed).to_be_bytes());
    hex::encode(&hasher.finalize()[..6])
}

impl ParticipantId {
    /// Generate a participant identifier from the owning study and the
    /// enrollment ordinal.
    pub fn generate(study: &StudyId, ordinal: u32) -> Self {
        Self(format!(
            "PT-{}",
            short_digest(&[study.as_str().as_bytes(), &ordinal.to_be_bytes()])
        ))
    }
}

impl DataPointId {
    pub fn generate(participant: &ParticipantId, form_id: &str) -> Self {
        Self(format!(
            "DP-{}",
            short_digest(&[participant.as_str().as_bytes(), form_id.as_bytes()])
        ))
    }
}

impl QueryId {
    pub fn generate(data_point: &DataPointId) -> Self {
        Self(format!("QY-{}", short_digest(&[data_point.as_str().as_bytes()])))
    }
}

impl AdverseEventId {
    pub fn generate(participant: &ParticipantId) -> Self {
        Self(format!("AE-{}", short_digest(&[participant.as_str().as_bytes()])))
    }
}

impl DocumentId {
    pub fn generate(doc_type: &str) -> Self {
        Self(format!("DOC-{}", short_digest(&[doc_type.as_bytes()])))
    }
}

impl CheckResultId {
    pub fn generate(check: &CheckId) -> Self {
        Self(format!("CR-{}", short_digest(&[check.as_str().as_bytes()])))
    }
}

impl AuditEventId {
    pub fn generate(entity_key: &str) -> Self {
        Self(format!("AU-{}", short_digest(&[entity_key.as_bytes()])))
    }
}

/// Anonymized subject code shown on CRFs and reports.
///
/// Derived from the study identifier, the enrollment ordinal, and the
/// enrollment timestamp. Direct identifiers are never an input, so the code
/// cannot be reversed to one.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SubjectCode(String);

impl SubjectCode {
    pub fn derive(study: &StudyId, ordinal: u32, enrolled_at: chrono::DateTime<chrono::Utc>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(study.as_str().as_bytes());
        hasher.update(ordinal.to_be_bytes());
        hasher.update(
            enrolled_at
                .timestamp_nanos_opt()
                .unwrap_or(enrolled_at.timestamp())
                .to_be_bytes(),
        );
        let digest = hasher.finalize();
        Self(format!("SUBJ-{}", hex::encode(&digest[..5]).to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_rejects_blank_input() {
        assert!(StudyId::new("  ").is_err());
        assert!(StudyId::new("").is_err());
    }

    #[test]
    fn id_trims_whitespace() {
        let id = StudyId::new(" STUDY-001 ").unwrap();
        assert_eq!(id.as_str(), "STUDY-001");
    }

    #[test]
    fn generated_ids_are_unique() {
        let study = StudyId::new("S1").unwrap();
        let a = ParticipantId::generate(&study, 1);
        let b = ParticipantId::generate(&study, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn repeated_generation_from_identical_inputs_never_collides() {
        let study = StudyId::new("S1").unwrap();
        let participant = ParticipantId::generate(&study, 1);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            assert!(seen.insert(DataPointId::generate(&participant, "vital_signs")));
        }
    }

    #[test]
    fn subject_code_is_not_derived_from_demographics() {
        let study = StudyId::new("S1").unwrap();
        let now = chrono::Utc::now();
        let code = SubjectCode::derive(&study, 1, now);
        assert!(code.as_str().starts_with("SUBJ-"));
    }
}
