//! Append-only audit log.
//!
//! Every mutating operation in the engine writes through here. Trails are
//! kept per subject entity plus one global trail; entries are appended,
//! never edited or truncated, and are retained for the full regulatory
//! retention period (deletion is not part of the API).
//!
//! An append failure is fatal for the enclosing mutation: it surfaces as
//! [`CoreError::AuditWrite`] and the caller must report the mutation as
//! failed.

use std::sync::Arc;

use tracing::debug;

use edc_model::{AuditEvent, CoreError, EntityRef, EventBus, Notification, Result};
use edc_persistence::{EntityLocks, SnapshotStore, keys, load, save};

/// The audit log. Cheap to clone via the shared store handle.
pub struct AuditLog {
    store: Arc<dyn SnapshotStore>,
    locks: EntityLocks,
    bus: Arc<dyn EventBus>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn SnapshotStore>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            store,
            locks: EntityLocks::new(),
            bus,
        }
    }

    /// Append one entry to the subject entity's trail and the global trail.
    ///
    /// Concurrent appends for different entities are safe; appends for the
    /// same entity serialize on the trail key, so per-entity order matches
    /// the order of the mutating calls. Each successful append is announced
    /// on the event bus for downstream monitors.
    pub fn append(&self, event: &AuditEvent) -> Result<()> {
        let trail_key = keys::audit_trail(&event.entity);
        self.append_to(&trail_key, event)?;
        self.append_to(keys::GLOBAL_AUDIT, event)?;
        debug!(
            entity = %event.entity,
            action = %event.action,
            actor = %event.actor,
            "audit entry recorded"
        );
        self.bus.publish(Notification::AuditEventRecorded {
            entity: event.entity.clone(),
        });
        Ok(())
    }

    fn append_to(&self, trail_key: &str, event: &AuditEvent) -> Result<()> {
        self.locks.with_entity(trail_key, || {
            let mut trail: Vec<AuditEvent> = load(self.store.as_ref(), trail_key)
                .map_err(|error| audit_write_error(&event.entity, error))?
                .unwrap_or_default();
            trail.push(event.clone());
            save(self.store.as_ref(), trail_key, &trail)
                .map_err(|error| audit_write_error(&event.entity, error))
        })
    }

    /// Read the trail for one entity, in append order.
    pub fn events_for(&self, entity: &EntityRef) -> Result<Vec<AuditEvent>> {
        let trail = load(self.store.as_ref(), &keys::audit_trail(entity))?;
        Ok(trail.unwrap_or_default())
    }

    /// Read the global trail spanning all entities.
    pub fn global_events(&self) -> Result<Vec<AuditEvent>> {
        let trail = load(self.store.as_ref(), keys::GLOBAL_AUDIT)?;
        Ok(trail.unwrap_or_default())
    }
}

fn audit_write_error(entity: &EntityRef, error: edc_persistence::StoreError) -> CoreError {
    CoreError::AuditWrite {
        entity: entity.to_string(),
        source: Box::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edc_model::{MemoryBus, NullBus, StudyId};
    use serde_json::json;

    fn log() -> AuditLog {
        AuditLog::new(
            Arc::new(edc_persistence::MemoryStore::new()),
            Arc::new(NullBus),
        )
    }

    fn study_ref() -> EntityRef {
        EntityRef::study(&StudyId::new("S1").unwrap())
    }

    #[test]
    fn trail_is_append_only() {
        let log = log();
        let entity = study_ref();

        log.append(&AuditEvent::new(entity.clone(), "crc", "created"))
            .unwrap();

        // Two reads with no intervening write are identical.
        let first = log.events_for(&entity).unwrap();
        let second = log.events_for(&entity).unwrap();
        assert_eq!(first, second);

        // One more write extends the trail by exactly one entry.
        log.append(
            &AuditEvent::new(entity.clone(), "crc", "status_changed")
                .with_before(json!("design"))
                .with_after(json!("active")),
        )
        .unwrap();
        let third = log.events_for(&entity).unwrap();
        assert_eq!(third.len(), first.len() + 1);
        assert_eq!(&third[..first.len()], &first[..]);
    }

    #[test]
    fn per_entity_order_matches_append_order() {
        let log = log();
        let entity = study_ref();
        for action in ["a", "b", "c"] {
            log.append(&AuditEvent::new(entity.clone(), "crc", action))
                .unwrap();
        }
        let actions: Vec<_> = log
            .events_for(&entity)
            .unwrap()
            .into_iter()
            .map(|event| event.action)
            .collect();
        assert_eq!(actions, vec!["a", "b", "c"]);
    }

    #[test]
    fn every_append_is_announced_on_the_bus() {
        let bus = Arc::new(MemoryBus::new());
        let log = AuditLog::new(
            Arc::new(edc_persistence::MemoryStore::new()),
            bus.clone(),
        );
        let entity = study_ref();
        log.append(&AuditEvent::new(entity.clone(), "crc", "created"))
            .unwrap();
        assert_eq!(
            bus.snapshot(),
            vec![Notification::AuditEventRecorded { entity }]
        );
    }

    #[test]
    fn global_trail_sees_all_entities() {
        let log = log();
        let study = study_ref();
        let other = EntityRef::new("document", "D1");
        log.append(&AuditEvent::new(study, "crc", "created")).unwrap();
        log.append(&AuditEvent::new(other, "reviewer", "uploaded"))
            .unwrap();
        assert_eq!(log.global_events().unwrap().len(), 2);
    }
}
