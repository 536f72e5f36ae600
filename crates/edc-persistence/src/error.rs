//! Persistence error types.

use thiserror::Error;

use edc_model::CoreError;

/// Snapshot store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (storage unavailable, write refused).
    #[error("storage backend failed to {operation} key {key:?}")]
    Backend {
        operation: &'static str,
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Snapshot could not be serialized.
    #[error("failed to serialize snapshot for key {key:?}")]
    Serialization {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Snapshot could not be deserialized.
    #[error("failed to deserialize snapshot for key {key:?}")]
    Deserialization {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<StoreError> for CoreError {
    fn from(error: StoreError) -> Self {
        CoreError::Persistence {
            source: Box::new(error),
        }
    }
}
