//! Tracing subscriber initialization for the coordination broker.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support;

pub use tracing_support::init;
