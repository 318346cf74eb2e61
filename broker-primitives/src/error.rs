//! Shared error definitions for broker primitive types.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or validating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// An identifier newtype (`project_id`, `session_name`, `task_id`, ...) failed validation.
    #[error("invalid {label}: {reason}")]
    InvalidId {
        /// Name of the identifier field that failed validation.
        label: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A data-model value failed validation (e.g. an out-of-range todo priority).
    #[error("invalid {what}: {reason}")]
    InvalidModel {
        /// Name of the value that failed validation.
        what: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
