//! Configuration loading errors.

use thiserror::Error;

/// Failures encountered while loading [`crate::Config`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed as the
    /// expected type.
    #[error("environment variable `{var}` has invalid value `{value}`: expected {expected}")]
    InvalidValue {
        /// Name of the offending variable.
        var: &'static str,
        /// The value as read from the environment.
        value: String,
        /// Human-readable description of the expected format.
        expected: &'static str,
    },

    /// A required environment variable was empty.
    #[error("environment variable `{var}` must not be empty")]
    Empty {
        /// Name of the offending variable.
        var: &'static str,
    },
}
