//! Compliance check definitions and execution.
//!
//! Checks are registered predicates resolved by id, not string branching.
//! A predicate returning `Err` is the "check could not run" case: the
//! error-status result is persisted before the error is surfaced, so
//! callers can distinguish "ran and failed" from "could not run".

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use edc_model::{
    AuditEvent, CheckId, CheckOutcome, CheckResultId, CheckSeverity, ComplianceCheckResult,
    CoreError, EntityRef, Notification, Participant, Result, Study,
};
use edc_persistence::{keys, save};

use crate::registry::ComplianceRegistry;

/// Scope supplied to a check predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckContext<'a> {
    pub study: Option<&'a Study>,
    pub participant: Option<&'a Participant>,
}

type CheckPredicate =
    Box<dyn Fn(&CheckContext<'_>) -> std::result::Result<bool, String> + Send + Sync>;

/// A registered compliance check.
pub struct CheckDefinition {
    pub id: CheckId,
    pub name: String,
    pub severity: CheckSeverity,
    predicate: CheckPredicate,
}

impl std::fmt::Debug for CheckDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

impl CheckDefinition {
    pub fn new(
        id: CheckId,
        name: impl Into<String>,
        severity: CheckSeverity,
        predicate: impl Fn(&CheckContext<'_>) -> std::result::Result<bool, String>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            severity,
            predicate: Box::new(predicate),
        }
    }
}

fn check_id(id: &'static str) -> CheckId {
    // Static literals below are non-empty by construction.
    CheckId::new(id).expect("static check id")
}

/// The built-in check table.
///
/// Scope-dependent checks pass vacuously when their scope is absent, so a
/// study-level batch run does not error on participant-level checks.
pub fn builtin_checks() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition::new(
            check_id("consent_present"),
            "Participant has a signed consent version on file",
            CheckSeverity::Critical,
            |ctx| {
                Ok(ctx
                    .participant
                    .is_none_or(|participant| !participant.consent.version.trim().is_empty()))
            },
        ),
        CheckDefinition::new(
            check_id("enrollment_within_target"),
            "Current enrollment does not exceed the protocol target",
            CheckSeverity::Critical,
            |ctx| {
                Ok(ctx.study.is_none_or(|study| {
                    study.current_enrollment <= study.protocol.target_enrollment
                }))
            },
        ),
        CheckDefinition::new(
            check_id("protocol_has_criteria"),
            "Protocol declares at least one inclusion criterion",
            CheckSeverity::Major,
            |ctx| {
                Ok(ctx
                    .study
                    .is_none_or(|study| !study.protocol.inclusion_criteria.is_empty()))
            },
        ),
        CheckDefinition::new(
            check_id("safety_review"),
            "Study is not under an unreviewed safety hold",
            CheckSeverity::Major,
            |ctx| {
                Ok(ctx
                    .study
                    .is_none_or(|study| study.status != edc_model::StudyStatus::SafetyHold))
            },
        ),
    ]
}

impl ComplianceRegistry {
    /// Execute one registered check and persist its result.
    ///
    /// A predicate error is persisted as an error-status result and then
    /// re-raised as [`CoreError::ComplianceCheckExecution`].
    pub fn run_compliance_check(
        &self,
        check_id: &CheckId,
        study: Option<&Study>,
        participant: Option<&Participant>,
    ) -> Result<ComplianceCheckResult> {
        let check = self
            .checks
            .get(check_id)
            .ok_or_else(|| CoreError::not_found("compliance check", check_id.as_str()))?;
        let (result, execution_error) = self.execute(check, study, participant)?;
        match execution_error {
            Some(detail) => Err(CoreError::ComplianceCheckExecution {
                check_id: check_id.as_str().to_string(),
                detail,
            }),
            None => Ok(result),
        }
    }

    /// Execute every registered check, collecting one result per check.
    ///
    /// Predicate failures and errors do not halt the batch; persistence
    /// failures do.
    pub fn run_all_compliance_checks(
        &self,
        study: Option<&Study>,
        participant: Option<&Participant>,
    ) -> Result<Vec<ComplianceCheckResult>> {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in self.checks.values() {
            let (result, _execution_error) = self.execute(check, study, participant)?;
            results.push(result);
        }
        Ok(results)
    }

    /// Run the predicate, persist and audit the result. Returns the result
    /// together with the predicate error detail, if any.
    fn execute(
        &self,
        check: &CheckDefinition,
        study: Option<&Study>,
        participant: Option<&Participant>,
    ) -> Result<(ComplianceCheckResult, Option<String>)> {
        let context = CheckContext { study, participant };
        let (outcome, detail, execution_error) = match (check.predicate)(&context) {
            Ok(true) => (CheckOutcome::Pass, format!("{}: passed", check.name), None),
            Ok(false) => (CheckOutcome::Fail, format!("{}: failed", check.name), None),
            Err(error) => (
                CheckOutcome::Error,
                format!("{}: {error}", check.name),
                Some(error),
            ),
        };
        if outcome != CheckOutcome::Pass {
            warn!(check = %check.id, outcome = %outcome, "compliance check did not pass");
        }

        let result = ComplianceCheckResult {
            id: CheckResultId::generate(&check.id),
            check_id: check.id.clone(),
            study_id: study.map(|study| study.id.clone()),
            participant_id: participant.map(|participant| participant.id.clone()),
            executed_at: Utc::now(),
            outcome,
            severity: check.severity,
            detail,
        };

        let key = keys::check_result(&result.id);
        self.locks.with_entity(&key, || -> Result<()> {
            save(self.store.as_ref(), &key, &result)?;
            self.audit.append(
                &AuditEvent::new(EntityRef::check_result(&result.id), "system", "recorded")
                    .with_after(json!({
                        "check_id": result.check_id,
                        "outcome": result.outcome,
                    })),
            )?;
            Ok(())
        })?;
        info!(check = %check.id, outcome = %outcome, "compliance check recorded");
        self.bus.publish(Notification::ComplianceCheckCompleted {
            check_id: check.id.clone(),
            outcome,
        });
        Ok((result, execution_error))
    }
}
