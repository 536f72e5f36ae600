//! Eligibility evaluation.
//!
//! Inclusion criteria are AND'd; exclusion criteria are OR'd-negated.
//! Evaluation stops at the first failing inclusion criterion or the first
//! matching exclusion criterion. A criterion referencing a field the
//! candidate does not carry evaluates to non-match, never an error.

use edc_model::{Candidate, Comparison, Criterion, StudyProtocol};

/// Outcome of an eligibility evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    /// The failing criterion's description, when ineligible.
    pub reason: Option<String>,
}

impl Eligibility {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    fn ineligible(reason: String) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }
}

/// Evaluate a candidate against the protocol's criteria.
pub fn evaluate(protocol: &StudyProtocol, candidate: &Candidate) -> Eligibility {
    for criterion in &protocol.inclusion_criteria {
        if !matches(criterion, candidate) {
            return Eligibility::ineligible(format!(
                "Does not meet inclusion criterion: {}",
                criterion.label()
            ));
        }
    }
    for criterion in &protocol.exclusion_criteria {
        if matches(criterion, candidate) {
            return Eligibility::ineligible(format!(
                "Meets exclusion criterion: {}",
                criterion.label()
            ));
        }
    }
    Eligibility::eligible()
}

/// Whether the candidate matches one criterion.
fn matches(criterion: &Criterion, candidate: &Candidate) -> bool {
    match criterion {
        Criterion::AgeRange { min, max, .. } => candidate
            .age
            .is_some_and(|age| age >= *min && age <= *max),
        Criterion::Diagnosis { code, .. } => candidate
            .diagnoses
            .iter()
            .any(|diagnosis| diagnosis.eq_ignore_ascii_case(code)),
        Criterion::Medication { name, .. } => candidate
            .medications
            .iter()
            .any(|medication| medication.eq_ignore_ascii_case(name)),
        Criterion::LabValue {
            test,
            op,
            value,
            upper,
            ..
        } => candidate
            .lab_values
            .get(test)
            .is_some_and(|result| compare(*result, *op, *value, *upper)),
    }
}

fn compare(result: f64, op: Comparison, value: f64, upper: Option<f64>) -> bool {
    match op {
        Comparison::Gt => result > value,
        Comparison::Lt => result < value,
        Comparison::Gte => result >= value,
        Comparison::Lte => result <= value,
        Comparison::Eq => (result - value).abs() < 1e-9,
        Comparison::Between => upper.is_some_and(|upper| result >= value && result <= upper),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_comparisons() {
        assert!(compare(61.0, Comparison::Gt, 60.0, None));
        assert!(!compare(60.0, Comparison::Gt, 60.0, None));
        assert!(compare(60.0, Comparison::Gte, 60.0, None));
        assert!(compare(59.0, Comparison::Lt, 60.0, None));
        assert!(compare(60.0, Comparison::Lte, 60.0, None));
        assert!(compare(60.0, Comparison::Eq, 60.0, None));
        assert!(compare(65.0, Comparison::Between, 60.0, Some(70.0)));
        assert!(!compare(75.0, Comparison::Between, 60.0, Some(70.0)));
        // Between without an upper bound never matches.
        assert!(!compare(65.0, Comparison::Between, 60.0, None));
    }
}
