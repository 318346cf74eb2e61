//! Errors produced while validating and routing a tool-call request, before
//! a coordination handler ever runs.

use thiserror::Error;

/// Failures the dispatcher can hit on its own, distinct from a
/// [`broker_kernel::BrokerError`] raised by the handler it routes to.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required argument was absent from the call.
    #[error("missing arg {0}")]
    MissingArg(&'static str),

    /// An argument was present but could not be interpreted as its expected type.
    #[error("invalid arg {name}: {reason}")]
    InvalidArg {
        /// Name of the offending argument.
        name: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The requested tool name has no registered handler.
    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    /// The coordination handler itself failed.
    #[error(transparent)]
    Broker(#[from] broker_kernel::BrokerError),
}
