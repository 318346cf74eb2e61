//! Coordination broker facade.
//!
//! Bundles the internal crates that make up the stdio JSON-RPC broker behind
//! one name, for anything embedding the broker as a library rather than
//! spawning the `broker` binary. Unlike the teacher's SDK facade, every
//! component here is always present — the broker is one cohesive service,
//! not a pluggable collection of optional runtime features.

#![warn(missing_docs, clippy::pedantic)]

/// JSON-RPC request/response envelopes for the stdio transport.
pub mod jsonrpc;

/// Identifier newtypes and wire data model.
pub use broker_primitives as primitives;

/// Coordination handlers and the liveness monitor.
pub use broker_kernel as kernel;

/// Tool dispatch: argument validation and routing.
pub use broker_dispatch as dispatch;

/// The abstract store trait and its implementations.
pub use broker_store as store;

/// Environment-driven configuration.
pub use broker_config as config;

/// Tracing subscriber initialization.
pub use broker_telemetry as telemetry;

pub use jsonrpc::{JsonRpcRequest, JsonRpcResponse};
