//! Validation tests against the built-in form definitions.

use std::collections::BTreeMap;

use edc_forms::{FieldDefinition, FieldKind, FormDefinition, FormRegistry, validate};
use serde_json::{Value, json};

fn values(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn complete_vital_signs() -> BTreeMap<String, Value> {
    values(&[
        ("measurement_date", json!("2026-03-14")),
        ("heart_rate", json!(85)),
        ("systolic_bp", json!(120)),
        ("diastolic_bp", json!(80)),
    ])
}

#[test]
fn missing_required_field_is_reported() {
    let registry = FormRegistry::builtin();
    let mut submission = complete_vital_signs();
    submission.remove("heart_rate");

    let outcome = validate(&registry, "vital_signs", &submission);
    assert!(!outcome.valid);
    assert_eq!(
        outcome.errors,
        vec!["Missing required field: heart_rate".to_string()]
    );
}

#[test]
fn complete_vital_signs_passes() {
    let registry = FormRegistry::builtin();
    let outcome = validate(&registry, "vital_signs", &complete_vital_signs());
    assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);
}

#[test]
fn all_violations_are_accumulated() {
    let registry = FormRegistry::builtin();
    let submission = values(&[
        ("heart_rate", json!(250)),
        ("systolic_bp", json!("not a number")),
    ]);

    let outcome = validate(&registry, "vital_signs", &submission);
    assert!(!outcome.valid);
    // Missing date + missing diastolic + hr bound + sbp not a number.
    assert_eq!(outcome.errors.len(), 4);
    assert!(
        outcome
            .errors
            .contains(&"Field 'heart_rate' exceeds the maximum of 200".to_string())
    );
    assert!(
        outcome
            .errors
            .contains(&"Field 'systolic_bp' must be a number".to_string())
    );
}

#[test]
fn numeric_strings_are_accepted() {
    let registry = FormRegistry::builtin();
    let mut submission = complete_vital_signs();
    submission.insert("heart_rate".to_string(), json!("85"));

    let outcome = validate(&registry, "vital_signs", &submission);
    assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);
}

#[test]
fn number_below_minimum_names_the_bound() {
    let registry = FormRegistry::builtin();
    let mut submission = complete_vital_signs();
    submission.insert("heart_rate".to_string(), json!(20));

    let outcome = validate(&registry, "vital_signs", &submission);
    assert_eq!(
        outcome.errors,
        vec!["Field 'heart_rate' is below the minimum of 30".to_string()]
    );
}

#[test]
fn select_rejects_undeclared_option() {
    let registry = FormRegistry::builtin();
    let mut submission = complete_vital_signs();
    submission.insert("position".to_string(), json!("upside_down"));

    let outcome = validate(&registry, "vital_signs", &submission);
    assert_eq!(
        outcome.errors,
        vec!["Field 'position' has invalid option 'upside_down'".to_string()]
    );
}

#[test]
fn multiselect_checks_each_value() {
    let registry = FormRegistry::builtin();
    let submission = values(&[
        ("event_term", json!("headache")),
        ("onset_date", json!("2026-02-01")),
        ("severity", json!("mild")),
        ("causality", json!("possible")),
        ("seriousness", json!(["hospitalization", "bad_day"])),
    ]);

    let outcome = validate(&registry, "adverse_event_report", &submission);
    assert_eq!(
        outcome.errors,
        vec!["Field 'seriousness' has invalid option 'bad_day'".to_string()]
    );
}

#[test]
fn dates_must_be_calendar_dates() {
    let registry = FormRegistry::builtin();
    let mut submission = complete_vital_signs();
    submission.insert("measurement_date".to_string(), json!("2026-02-30"));

    let outcome = validate(&registry, "vital_signs", &submission);
    assert_eq!(
        outcome.errors,
        vec!["Field 'measurement_date' must be a valid date (YYYY-MM-DD)".to_string()]
    );
}

#[test]
fn table_rows_name_index_and_column() {
    let registry = FormRegistry::builtin();
    let submission = values(&[(
        "medications",
        json!([
            {"drug_name": "metformin", "dose": "500mg", "frequency": "bid"},
            {"drug_name": "lisinopril", "dose": ""},
        ]),
    )]);

    let outcome = validate(&registry, "concomitant_medications", &submission);
    assert!(!outcome.valid);
    assert_eq!(
        outcome.errors,
        vec![
            "Field 'medications' row 2: missing required column 'dose'".to_string(),
            "Field 'medications' row 2: missing required column 'frequency'".to_string(),
        ]
    );
}

#[test]
fn unknown_form_yields_single_error() {
    let registry = FormRegistry::builtin();
    let outcome = validate(&registry, "no_such_form", &BTreeMap::new());
    assert!(!outcome.valid);
    assert_eq!(outcome.errors, vec!["Unknown form: no_such_form".to_string()]);
}

#[test]
fn boolean_fields_reject_strings() {
    let mut registry = FormRegistry::empty();
    registry.register(FormDefinition {
        id: "consent_confirmation".to_string(),
        title: "Consent Confirmation".to_string(),
        fields: vec![FieldDefinition::required("confirmed", FieldKind::Boolean)],
    });

    let outcome = validate(
        &registry,
        "consent_confirmation",
        &values(&[("confirmed", json!("yes"))]),
    );
    assert_eq!(
        outcome.errors,
        vec!["Field 'confirmed' must be a boolean".to_string()]
    );
}
