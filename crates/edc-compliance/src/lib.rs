//! Document & compliance registry.
//!
//! Owns the regulatory document version/approval state machine and the
//! registered compliance check table. All mutations write through the
//! audit log.

mod checks;
mod documents;
mod registry;

pub use checks::{CheckContext, CheckDefinition, builtin_checks};
pub use documents::VersionBump;
pub use registry::ComplianceRegistry;
