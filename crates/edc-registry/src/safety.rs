//! Aggregate safety profile and stopping-rule policy.

use edc_model::{AdverseEvent, Severity, Study};

/// Aggregate safety figures for one study.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyProfile {
    pub total_events: u32,
    pub severe_events: u32,
    /// Events carrying at least one seriousness category.
    pub serious_events: u32,
    pub probable_or_definite: u32,
}

impl SafetyProfile {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a AdverseEvent>) -> Self {
        let mut profile = Self::default();
        for event in events {
            profile.total_events += 1;
            if event.severity == Severity::Severe {
                profile.severe_events += 1;
            }
            if event.is_serious() {
                profile.serious_events += 1;
            }
            if event.causality.suggests_relation() {
                profile.probable_or_definite += 1;
            }
        }
        profile
    }
}

/// Stopping-rule policy. The threshold formula is domain configuration,
/// never engine logic.
pub trait StoppingRule: Send + Sync {
    fn should_hold(&self, study: &Study, profile: &SafetyProfile) -> bool;
}

/// Default policy: apply the thresholds from the protocol's safety
/// configuration. A bound triggers once the count exceeds it; an absent
/// bound never triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolThresholds;

impl StoppingRule for ProtocolThresholds {
    fn should_hold(&self, study: &Study, profile: &SafetyProfile) -> bool {
        let safety = &study.protocol.safety;
        let severe_exceeded = safety
            .max_severe_events
            .is_some_and(|max| profile.severe_events > max);
        let serious_exceeded = safety
            .max_serious_events
            .is_some_and(|max| profile.serious_events > max);
        severe_exceeded || serious_exceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edc_model::{
        Causality, SafetyConfig, SeriousnessCategory, Severity, Study, StudyId, StudyPhase,
        StudyProtocol,
    };

    fn study(safety: SafetyConfig) -> Study {
        Study::new(
            StudyId::new("S1").unwrap(),
            StudyProtocol {
                title: "Safety".to_string(),
                phase: StudyPhase::Phase3,
                primary_endpoints: vec![],
                secondary_endpoints: vec![],
                inclusion_criteria: vec![],
                exclusion_criteria: vec![],
                target_enrollment: 10,
                sites: vec![],
                visits: vec![],
                safety,
            },
        )
    }

    fn event(severity: Severity, serious: bool) -> AdverseEvent {
        use std::collections::BTreeSet;
        let study_id = StudyId::new("S1").unwrap();
        let participant_id = edc_model::ParticipantId::generate(&study_id, 1);
        let seriousness: BTreeSet<_> = if serious {
            [SeriousnessCategory::Hospitalization].into_iter().collect()
        } else {
            BTreeSet::new()
        };
        AdverseEvent {
            id: edc_model::AdverseEventId::generate(&participant_id),
            participant_id,
            study_id,
            term: "headache".to_string(),
            severity,
            causality: Causality::Possible,
            regulatory_reporting_required: serious,
            seriousness,
            onset: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            resolution: None,
            report_dispatched: false,
            recorded_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn profile_aggregates_counts() {
        let events = vec![
            event(Severity::Mild, false),
            event(Severity::Severe, true),
            event(Severity::Severe, false),
        ];
        let profile = SafetyProfile::from_events(&events);
        assert_eq!(profile.total_events, 3);
        assert_eq!(profile.severe_events, 2);
        assert_eq!(profile.serious_events, 1);
    }

    #[test]
    fn threshold_triggers_only_when_exceeded() {
        let study = study(SafetyConfig {
            max_severe_events: Some(2),
            max_serious_events: None,
        });
        let rule = ProtocolThresholds;

        let at_limit = SafetyProfile {
            severe_events: 2,
            ..SafetyProfile::default()
        };
        assert!(!rule.should_hold(&study, &at_limit));

        let over_limit = SafetyProfile {
            severe_events: 3,
            ..SafetyProfile::default()
        };
        assert!(rule.should_hold(&study, &over_limit));
    }

    #[test]
    fn absent_bounds_never_trigger() {
        let study = study(SafetyConfig::default());
        let profile = SafetyProfile {
            total_events: 50,
            severe_events: 50,
            serious_events: 50,
            probable_or_definite: 50,
        };
        assert!(!ProtocolThresholds.should_hold(&study, &profile));
    }
}
