//! Visit schedule generation.

use edc_model::{StudyPhase, StudyProtocol, VisitDefinition};

/// The participant's visit schedule, from the protocol template or a
/// phase-appropriate default when the protocol declares none.
pub(crate) fn generate_visit_schedule(protocol: &StudyProtocol) -> Vec<VisitDefinition> {
    if !protocol.visits.is_empty() {
        return protocol.visits.clone();
    }
    default_schedule(protocol.phase)
}

fn visit(number: u32, name: &str, offset_days: i64, forms: &[&str]) -> VisitDefinition {
    VisitDefinition {
        number,
        name: name.to_string(),
        offset_days,
        forms: forms.iter().map(|form| (*form).to_string()).collect(),
    }
}

fn default_schedule(phase: StudyPhase) -> Vec<VisitDefinition> {
    let mut schedule = vec![
        visit(1, "Screening", -14, &["demographics", "laboratory_results"]),
        visit(
            2,
            "Baseline",
            0,
            &["vital_signs", "laboratory_results", "concomitant_medications"],
        ),
        visit(3, "Week 4", 28, &["vital_signs", "adverse_event_report"]),
        visit(4, "Week 8", 56, &["vital_signs", "adverse_event_report"]),
    ];
    // Later-phase studies carry a longer follow-up tail.
    if matches!(phase, StudyPhase::Phase3 | StudyPhase::Phase4) {
        schedule.push(visit(5, "Week 16", 112, &["vital_signs", "adverse_event_report"]));
    }
    schedule.push(visit(
        schedule.len() as u32 + 1,
        "Close-out",
        match phase {
            StudyPhase::Phase3 | StudyPhase::Phase4 => 140,
            _ => 84,
        },
        &["vital_signs", "laboratory_results"],
    ));
    schedule
}
