//! Shared utilities for starlight.
//!
//! Currently this is the logging setup used by the server binary and
//! by anything embedding the MCP server that wants the same output format.

pub mod log;

pub use log::{LogConfig, LogLevel};
