use std::collections::BTreeMap;
use std::sync::Arc;

use edc_audit::AuditLog;
use edc_model::{CheckId, EventBus};
use edc_persistence::{EntityLocks, SnapshotStore};

use crate::checks::{CheckDefinition, builtin_checks};

/// The document & compliance registry.
pub struct ComplianceRegistry {
    pub(crate) store: Arc<dyn SnapshotStore>,
    pub(crate) locks: EntityLocks,
    pub(crate) audit: Arc<AuditLog>,
    pub(crate) bus: Arc<dyn EventBus>,
    pub(crate) checks: BTreeMap<CheckId, CheckDefinition>,
}

impl ComplianceRegistry {
    /// Registry with the built-in check table.
    pub fn new(store: Arc<dyn SnapshotStore>, audit: Arc<AuditLog>, bus: Arc<dyn EventBus>) -> Self {
        let mut registry = Self {
            store,
            locks: EntityLocks::new(),
            audit,
            bus,
            checks: BTreeMap::new(),
        };
        for check in builtin_checks() {
            registry.register_check(check);
        }
        registry
    }

    /// Register a check definition, replacing any prior one with the same id.
    /// Registration happens at wiring time, before the registry is shared.
    pub fn register_check(&mut self, check: CheckDefinition) {
        self.checks.insert(check.id.clone(), check);
    }

    /// Registered check definitions, ordered by id.
    pub fn checks(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.values()
    }
}
