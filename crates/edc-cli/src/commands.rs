//! Command implementations.
//!
//! Each command wires an in-memory engine, performs its operation, and
//! prints a human-readable report to stdout. The exit code reflects
//! whether the report contains failures.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use edc_audit::AuditLog;
use edc_capture::EdcStore;
use edc_compliance::ComplianceRegistry;
use edc_forms::{FormRegistry, validate};
use edc_model::{CheckOutcome, NullBus, NullDispatcher, StudyId, StudyProtocol};
use edc_persistence::MemoryStore;
use edc_registry::StudyRegistry;

use crate::cli::{FormsValidateArgs, StudyArgs};
use edc_cli::logging::redact_value;

/// List the built-in case report forms with their field checklists.
pub fn run_forms_list() -> Result<()> {
    let registry = FormRegistry::builtin();
    for form in registry.forms() {
        println!("{} - {}", form.id, form.title);
        for field in &form.fields {
            let requirement = if field.required { "required" } else { "optional" };
            println!("  {} ({requirement})", field.name);
        }
    }
    Ok(())
}

/// Validate a JSON data file against a form. Returns false on violations.
pub fn run_forms_validate(args: &FormsValidateArgs) -> Result<bool> {
    let raw = fs::read_to_string(&args.data_file)
        .with_context(|| format!("failed to read {}", args.data_file.display()))?;
    let fields: BTreeMap<String, Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object", args.data_file.display()))?;
    for (name, value) in &fields {
        debug!(field = %name, value = %redact_value(&value.to_string()), "validating field");
    }

    let registry = FormRegistry::builtin();
    let outcome = validate(&registry, &args.form_id, &fields);
    if outcome.valid {
        println!("{}: valid ({} field(s))", args.form_id, fields.len());
        return Ok(true);
    }
    println!("{}: {} violation(s)", args.form_id, outcome.errors.len());
    for error in &outcome.errors {
        println!("  {error}");
    }
    Ok(false)
}

fn engine() -> StudyRegistry {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(NullBus);
    let audit = Arc::new(AuditLog::new(store.clone(), bus.clone()));
    let edc = Arc::new(EdcStore::new(
        store.clone(),
        FormRegistry::builtin(),
        audit.clone(),
        bus.clone(),
    ));
    let compliance = Arc::new(ComplianceRegistry::new(
        store.clone(),
        audit.clone(),
        bus.clone(),
    ));
    StudyRegistry::new(store, edc, compliance, audit, bus, Arc::new(NullDispatcher))
}

fn load_protocol(args: &StudyArgs) -> Result<(StudyId, StudyProtocol)> {
    let raw = fs::read_to_string(&args.protocol_file)
        .with_context(|| format!("failed to read {}", args.protocol_file.display()))?;
    let protocol: StudyProtocol = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid protocol", args.protocol_file.display()))?;
    let study_id = StudyId::new(&args.study_id)?;
    Ok((study_id, protocol))
}

/// Define a study from a protocol file and print its summary.
pub fn run_study_define(args: &StudyArgs) -> Result<()> {
    let (study_id, protocol) = load_protocol(args)?;
    let registry = engine();
    let study = registry.define_study(study_id, protocol)?;

    println!("{}: {}", study.id, study.protocol.title);
    println!("  phase: {:?}", study.protocol.phase);
    println!("  status: {}", study.status);
    println!("  target enrollment: {}", study.protocol.target_enrollment);
    println!(
        "  criteria: {} inclusion, {} exclusion",
        study.protocol.inclusion_criteria.len(),
        study.protocol.exclusion_criteria.len()
    );
    for criterion in &study.protocol.inclusion_criteria {
        println!("    include: {}", criterion.label());
    }
    for criterion in &study.protocol.exclusion_criteria {
        println!("    exclude: {}", criterion.label());
    }
    Ok(())
}

/// Define a study and run every registered compliance check against it.
/// Returns false when any check did not pass.
pub fn run_study_check(args: &StudyArgs) -> Result<bool> {
    let (study_id, protocol) = load_protocol(args)?;
    let registry = engine();
    registry.define_study(study_id.clone(), protocol)?;
    let results = registry.run_study_compliance(&study_id)?;

    let mut all_passed = true;
    println!("{study_id}: {} check(s)", results.len());
    for result in &results {
        let marker = match result.outcome {
            CheckOutcome::Pass => "PASS",
            CheckOutcome::Fail => {
                all_passed = false;
                "FAIL"
            }
            CheckOutcome::Error => {
                all_passed = false;
                "ERROR"
            }
        };
        println!(
            "  [{marker}] {} ({}): {}",
            result.check_id, result.severity, result.detail
        );
    }
    Ok(all_passed)
}
