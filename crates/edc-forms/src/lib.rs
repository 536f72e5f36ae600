pub mod builtin;
pub mod definition;
pub mod validate;

pub use builtin::builtin_forms;
pub use definition::{FieldDefinition, FieldKind, FormDefinition, FormRegistry};
pub use validate::{FormOutcome, validate};
