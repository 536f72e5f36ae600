//! Study registry: study lifecycle, enrollment, and safety monitoring.
//!
//! [`StudyRegistry`] is the engine's front door. It owns study snapshots
//! and adverse events, and delegates participant data capture to
//! `edc-capture` and document/check machinery to `edc-compliance`.

mod enrollment;
mod registry;
mod safety;

pub use registry::{AdverseEventUpdate, StudyRegistry};
pub use safety::{ProtocolThresholds, SafetyProfile, StoppingRule};
