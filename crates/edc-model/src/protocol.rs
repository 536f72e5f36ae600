//! Study protocol definitions.
//!
//! A protocol is supplied at study definition time (typically deserialized
//! from JSON) and is the source of the eligibility criteria, the visit
//! schedule template, and the safety stopping-rule configuration.

use serde::{Deserialize, Serialize};

/// Clinical trial phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyPhase {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
    Observational,
}

/// Comparison operator for lab value criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Between,
}

/// One inclusion or exclusion criterion.
///
/// A closed variant set rather than a stringly-typed dispatch: the evaluator
/// matches exhaustively, and protocol JSON uses the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    /// Candidate age within `[min, max]` inclusive.
    AgeRange {
        min: u32,
        max: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Candidate's diagnosis list contains the coded value.
    Diagnosis {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Candidate's medication list contains the named drug.
    Medication {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Numeric comparison against a named lab result. `upper` is only
    /// meaningful for `Comparison::Between`.
    LabValue {
        test: String,
        op: Comparison,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upper: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Criterion {
    /// Human-readable label for rejection reasons: the stated description,
    /// or a generated identifier when none was given.
    pub fn label(&self) -> String {
        match self {
            Criterion::AgeRange {
                min,
                max,
                description,
            } => description
                .clone()
                .unwrap_or_else(|| format!("age_range[{min},{max}]")),
            Criterion::Diagnosis { code, description } => description
                .clone()
                .unwrap_or_else(|| format!("diagnosis[{code}]")),
            Criterion::Medication { name, description } => description
                .clone()
                .unwrap_or_else(|| format!("medication[{name}]")),
            Criterion::LabValue {
                test,
                op,
                value,
                upper,
                description,
            } => description.clone().unwrap_or_else(|| match upper {
                Some(upper) => format!("lab_value[{test} {op:?} {value}..{upper}]"),
                None => format!("lab_value[{test} {op:?} {value}]"),
            }),
        }
    }
}

/// One scheduled visit with its form checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDefinition {
    pub number: u32,
    pub name: String,
    /// Days relative to enrollment.
    pub offset_days: i64,
    /// Forms to be completed at this visit, by form id.
    pub forms: Vec<String>,
}

/// Safety stopping-rule thresholds, supplied by configuration.
///
/// Either bound may be absent; an absent bound never triggers. The concrete
/// formula is domain policy, not engine logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_severe_events: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_serious_events: Option<u32>,
}

/// Full study protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyProtocol {
    pub title: String,
    pub phase: StudyPhase,
    #[serde(default)]
    pub primary_endpoints: Vec<String>,
    #[serde(default)]
    pub secondary_endpoints: Vec<String>,
    #[serde(default)]
    pub inclusion_criteria: Vec<Criterion>,
    #[serde(default)]
    pub exclusion_criteria: Vec<Criterion>,
    pub target_enrollment: u32,
    #[serde(default)]
    pub sites: Vec<String>,
    /// Visit schedule template; cloned per participant at enrollment.
    /// When empty, a default schedule is generated from the phase.
    #[serde(default)]
    pub visits: Vec<VisitDefinition>,
    #[serde(default)]
    pub safety: SafetyConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criterion_label_prefers_description() {
        let criterion = Criterion::AgeRange {
            min: 18,
            max: 65,
            description: Some("Adults 18-65".to_string()),
        };
        assert_eq!(criterion.label(), "Adults 18-65");
    }

    #[test]
    fn criterion_label_generates_identifier() {
        let criterion = Criterion::AgeRange {
            min: 18,
            max: 65,
            description: None,
        };
        assert_eq!(criterion.label(), "age_range[18,65]");
    }

    #[test]
    fn criterion_json_uses_type_tag() {
        let json = r#"{"type":"lab_value","test":"egfr","op":"gte","value":60.0}"#;
        let criterion: Criterion = serde_json::from_str(json).unwrap();
        assert!(matches!(
            criterion,
            Criterion::LabValue {
                op: Comparison::Gte,
                ..
            }
        ));
    }
}
