//! Environment-driven configuration for the coordination broker.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod loader;
mod schema;

/// Errors raised while loading configuration.
pub use error::ConfigError;
/// The typed configuration struct and its documented defaults.
pub use schema::Config;
