//! Error type for the abstract store.

use thiserror::Error;

/// Result alias used by [`crate::Store`] implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by a [`crate::Store`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached after exhausting its retry budget.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A value read back from the store failed to deserialize.
    #[error("corrupt stored value at key `{key}`: {source}")]
    Corrupt {
        /// The offending key.
        key: String,
        /// Underlying deserialization error.
        source: serde_json::Error,
    },

    /// Any other backend-reported failure.
    #[error("store error: {0}")]
    Backend(String),
}
