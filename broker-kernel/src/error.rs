//! The coordination handler error taxonomy.

use broker_store::StoreError;
use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the coordination handlers.
pub type BrokerResult<T> = std::result::Result<T, BrokerError>;

/// The error taxonomy described in the coordination protocol: every variant
/// maps to a wire-level `status`/`error` tag lowered by the dispatcher.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Generic argument or usage failure. Caller bug.
    #[error("{0}")]
    Invalid(String),

    /// The agent has no registration, or was reaped. Recoverable by re-registering.
    #[error("agent is not registered")]
    NotRegistered,

    /// The target of a query/response does not exist.
    #[error("agent not found")]
    AgentNotFound,

    /// A file lock is held by another session.
    #[error("file is locked by another session")]
    Conflict {
        /// The current lock holder's information, echoed back to the caller.
        lock_info: Value,
    },

    /// An interface lookup missed.
    #[error("interface not found")]
    NotFound {
        /// Candidate interface names judged similar to the query.
        similar: Vec<String>,
    },

    /// A synchronous `query_agent` call expired before a response arrived.
    #[error("query timed out")]
    Timeout,

    /// The backing store could not complete the operation after its retry budget.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl BrokerError {
    /// The machine-readable status/error tag for this variant, per the
    /// coordination protocol's error taxonomy.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "error",
            Self::NotRegistered => "not_registered",
            Self::AgentNotFound => "agent_not_found",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Timeout => "timeout",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
