//! Form submission validation.
//!
//! Pure function of (form id, field values, registry). All violations are
//! accumulated; the caller always receives the full list, never just the
//! first.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::definition::{FieldDefinition, FieldKind, FormRegistry};

/// Validation outcome for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl FormOutcome {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate `field_values` against the named form definition.
pub fn validate(
    registry: &FormRegistry,
    form_id: &str,
    field_values: &BTreeMap<String, Value>,
) -> FormOutcome {
    let Some(form) = registry.get(form_id) else {
        return FormOutcome {
            valid: false,
            errors: vec![format!("Unknown form: {form_id}")],
        };
    };

    let mut errors = Vec::new();
    for field in &form.fields {
        match field_values.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    errors.push(format!("Missing required field: {}", field.name));
                }
                // Absent fields are skipped for further checks.
            }
            Some(value) => check_field(field, value, &mut errors),
        }
    }
    FormOutcome::from_errors(errors)
}

fn check_field(field: &FieldDefinition, value: &Value, errors: &mut Vec<String>) {
    match &field.kind {
        FieldKind::Number { min, max } => check_number(&field.name, value, *min, *max, errors),
        FieldKind::Select { options } => check_select(&field.name, value, options, errors),
        FieldKind::MultiSelect { options } => {
            check_multi_select(&field.name, value, options, errors);
        }
        FieldKind::Date => check_date(&field.name, value, errors),
        FieldKind::Boolean => {
            if !value.is_boolean() {
                errors.push(format!("Field '{}' must be a boolean", field.name));
            }
        }
        FieldKind::Text => {
            if !value.is_string() {
                errors.push(format!("Field '{}' must be text", field.name));
            }
        }
        FieldKind::Table { required_columns } => {
            check_table(&field.name, value, required_columns, errors);
        }
    }
}

/// Accept JSON numbers and numeric strings; enforce declared bounds.
fn check_number(
    name: &str,
    value: &Value,
    min: Option<f64>,
    max: Option<f64>,
    errors: &mut Vec<String>,
) {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = parsed else {
        errors.push(format!("Field '{name}' must be a number"));
        return;
    };
    if let Some(min) = min
        && number < min
    {
        errors.push(format!("Field '{name}' is below the minimum of {min}"));
    }
    if let Some(max) = max
        && number > max
    {
        errors.push(format!("Field '{name}' exceeds the maximum of {max}"));
    }
}

fn check_select(name: &str, value: &Value, options: &[String], errors: &mut Vec<String>) {
    match value.as_str() {
        Some(choice) if options.iter().any(|option| option == choice) => {}
        Some(choice) => {
            errors.push(format!("Field '{name}' has invalid option '{choice}'"));
        }
        None => errors.push(format!("Field '{name}' must be one of the declared options")),
    }
}

fn check_multi_select(name: &str, value: &Value, options: &[String], errors: &mut Vec<String>) {
    let Some(choices) = value.as_array() else {
        errors.push(format!("Field '{name}' must be a list of options"));
        return;
    };
    for choice in choices {
        check_select(name, choice, options, errors);
    }
}

fn check_date(name: &str, value: &Value, errors: &mut Vec<String>) {
    let valid = value
        .as_str()
        .is_some_and(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok());
    if !valid {
        errors.push(format!("Field '{name}' must be a valid date (YYYY-MM-DD)"));
    }
}

fn check_table(name: &str, value: &Value, required_columns: &[String], errors: &mut Vec<String>) {
    let Some(rows) = value.as_array() else {
        errors.push(format!("Field '{name}' must be a table of rows"));
        return;
    };
    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        let Some(columns) = row.as_object() else {
            errors.push(format!("Field '{name}' row {row_number}: must be an object"));
            continue;
        };
        for column in required_columns {
            let missing = match columns.get(column) {
                None | Some(Value::Null) => true,
                Some(Value::String(text)) => text.trim().is_empty(),
                Some(_) => false,
            };
            if missing {
                errors.push(format!(
                    "Field '{name}' row {row_number}: missing required column '{column}'"
                ));
            }
        }
    }
}
