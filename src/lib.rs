//! MLOps agent
//!
//! Daemon-side model registry service plus the package installer that
//! feeds it.
//!
//! # Components
//!
//! - **registry**: the backend contract every registration goes through
//! - **ipc**: model interface handlers, wire protocol and socket transport
//! - **modules**: probe/init/exit lifecycle of daemon modules
//! - **installer**: RPK manifest parsing and package-manager plugin hooks
//!
//! The daemon never stores anything itself. Handlers forward each call to
//! the backend and pass its status back unchanged.

pub mod config;
pub mod daemon;
pub mod installer;
pub mod ipc;
pub mod modules;
pub mod registry;
pub mod shutdown;
pub mod telemetry;

pub use daemon::Daemon;
pub use registry::{BackendError, MemoryBackend, RegistrationBackend, Status};
