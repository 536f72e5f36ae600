//! Built-in form definitions for the standard study visit checklist.

use crate::definition::{FieldDefinition, FieldKind, FormDefinition};

/// The forms every study can rely on without registering its own.
pub fn builtin_forms() -> Vec<FormDefinition> {
    vec![
        vital_signs(),
        demographics(),
        adverse_event_report(),
        concomitant_medications(),
        laboratory_results(),
    ]
}

fn vital_signs() -> FormDefinition {
    FormDefinition {
        id: "vital_signs".to_string(),
        title: "Vital Signs".to_string(),
        fields: vec![
            FieldDefinition::required("measurement_date", FieldKind::Date),
            FieldDefinition::required(
                "heart_rate",
                FieldKind::Number {
                    min: Some(30.0),
                    max: Some(200.0),
                },
            ),
            FieldDefinition::required(
                "systolic_bp",
                FieldKind::Number {
                    min: Some(60.0),
                    max: Some(250.0),
                },
            ),
            FieldDefinition::required(
                "diastolic_bp",
                FieldKind::Number {
                    min: Some(30.0),
                    max: Some(150.0),
                },
            ),
            FieldDefinition::optional(
                "temperature_c",
                FieldKind::Number {
                    min: Some(32.0),
                    max: Some(43.0),
                },
            ),
            FieldDefinition::optional(
                "position",
                FieldKind::Select {
                    options: vec![
                        "sitting".to_string(),
                        "standing".to_string(),
                        "supine".to_string(),
                    ],
                },
            ),
        ],
    }
}

fn demographics() -> FormDefinition {
    FormDefinition {
        id: "demographics".to_string(),
        title: "Demographics".to_string(),
        fields: vec![
            FieldDefinition::required(
                "age_group",
                FieldKind::Select {
                    options: vec![
                        "18-29".to_string(),
                        "30-39".to_string(),
                        "40-49".to_string(),
                        "50-64".to_string(),
                        "65+".to_string(),
                    ],
                },
            ),
            FieldDefinition::required(
                "sex",
                FieldKind::Select {
                    options: vec![
                        "female".to_string(),
                        "male".to_string(),
                        "intersex".to_string(),
                        "undisclosed".to_string(),
                    ],
                },
            ),
            FieldDefinition::optional(
                "ethnicity",
                FieldKind::Select {
                    options: vec![
                        "hispanic_or_latino".to_string(),
                        "not_hispanic_or_latino".to_string(),
                        "undisclosed".to_string(),
                    ],
                },
            ),
            FieldDefinition::optional("smoker", FieldKind::Boolean),
        ],
    }
}

fn adverse_event_report() -> FormDefinition {
    FormDefinition {
        id: "adverse_event_report".to_string(),
        title: "Adverse Event Report".to_string(),
        fields: vec![
            FieldDefinition::required("event_term", FieldKind::Text),
            FieldDefinition::required("onset_date", FieldKind::Date),
            FieldDefinition::optional("resolution_date", FieldKind::Date),
            FieldDefinition::required(
                "severity",
                FieldKind::Select {
                    options: vec![
                        "mild".to_string(),
                        "moderate".to_string(),
                        "severe".to_string(),
                    ],
                },
            ),
            FieldDefinition::required(
                "causality",
                FieldKind::Select {
                    options: vec![
                        "unrelated".to_string(),
                        "unlikely".to_string(),
                        "possible".to_string(),
                        "probable".to_string(),
                        "definite".to_string(),
                    ],
                },
            ),
            FieldDefinition::optional(
                "seriousness",
                FieldKind::MultiSelect {
                    options: vec![
                        "death".to_string(),
                        "life_threatening".to_string(),
                        "hospitalization".to_string(),
                        "disability".to_string(),
                        "congenital_anomaly".to_string(),
                        "medically_important".to_string(),
                    ],
                },
            ),
            FieldDefinition::optional("ongoing", FieldKind::Boolean),
        ],
    }
}

fn concomitant_medications() -> FormDefinition {
    FormDefinition {
        id: "concomitant_medications".to_string(),
        title: "Concomitant Medications".to_string(),
        fields: vec![FieldDefinition::required(
            "medications",
            FieldKind::Table {
                required_columns: vec![
                    "drug_name".to_string(),
                    "dose".to_string(),
                    "frequency".to_string(),
                ],
            },
        )],
    }
}

fn laboratory_results() -> FormDefinition {
    FormDefinition {
        id: "laboratory_results".to_string(),
        title: "Laboratory Results".to_string(),
        fields: vec![
            FieldDefinition::required("collection_date", FieldKind::Date),
            FieldDefinition::required(
                "results",
                FieldKind::Table {
                    required_columns: vec![
                        "test_name".to_string(),
                        "value".to_string(),
                        "unit".to_string(),
                    ],
                },
            ),
            FieldDefinition::optional("fasting", FieldKind::Boolean),
        ],
    }
}
