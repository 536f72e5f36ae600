//! Form definitions.
//!
//! A form definition enumerates its fields; each field carries a kind and
//! the constraints the validator enforces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field kind with its constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Numeric value, optionally bounded inclusive.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Single value drawn from the option set.
    Select { options: Vec<String> },
    /// List of values, each drawn from the option set.
    MultiSelect { options: Vec<String> },
    /// Calendar date, ISO 8601 (`YYYY-MM-DD`).
    Date,
    Boolean,
    Text,
    /// Sequence of rows; each row must carry the required columns.
    Table { required_columns: Vec<String> },
}

/// One field of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn required(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            kind,
            required: false,
        }
    }
}

/// A named case-report-form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldDefinition>,
}

/// Registry of form definitions, keyed by form id.
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: BTreeMap<String, FormDefinition>,
}

impl FormRegistry {
    /// Empty registry; definitions are registered by the embedder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in study forms.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for form in crate::builtin::builtin_forms() {
            registry.register(form);
        }
        registry
    }

    /// Register a definition, replacing any prior one with the same id.
    pub fn register(&mut self, form: FormDefinition) {
        self.forms.insert(form.id.clone(), form);
    }

    pub fn get(&self, form_id: &str) -> Option<&FormDefinition> {
        self.forms.get(form_id)
    }

    /// All registered definitions, ordered by id.
    pub fn forms(&self) -> impl Iterator<Item = &FormDefinition> {
        self.forms.values()
    }
}
