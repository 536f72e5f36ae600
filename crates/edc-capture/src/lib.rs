//! Electronic data capture store.
//!
//! Owns Participant, DataPoint, and Query records. Submissions are schema
//! validated before anything is persisted; every mutating call appends one
//! audit entry (entity trail plus global trail) and emits a notification
//! where the contract names one.

mod store;

pub use store::EdcStore;
