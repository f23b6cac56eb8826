//! Telemetry module for the MLOps agent.
//!
//! Structured logging through `tracing`; output is JSON or pretty text.

mod logging;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
