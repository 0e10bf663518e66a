//! Infrastructure layer - configuration and logging setup
//!
//! Loads the relay's settings and installs the tracing subscriber shared by
//! the server and console binaries.

pub mod config;
pub mod telemetry;

pub use config::{AppConfig, LogFormat, ServerConfig};
pub use telemetry::{TelemetryError, init_tracing};
