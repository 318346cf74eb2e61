//! Tool dispatch: the enumerated tool metadata table and the router that
//! validates arguments, applies the implicit-heartbeat side effect, and
//! invokes the matching coordination handler.

#![warn(missing_docs, clippy::pedantic)]

mod args;
mod dispatch;
mod error;
mod registry;

pub use dispatch::call_tool;
pub use error::DispatchError;
pub use registry::{ToolMetadata, HEARTBEAT_ON_CALL, TOOLS};

/// Returns the metadata for every tool the dispatcher can route.
#[must_use]
pub fn list_tools() -> &'static [ToolMetadata] {
    TOOLS
}
