//! Registration backend contract for the MLOps agent.
//!
//! The backend owns durable storage of models, pipelines and resources.
//! Everything else in this crate only calls into it and forwards its
//! status codes.

mod backend;
mod memory;
mod records;

pub use backend::{
    BackendError, RegistrationBackend, Status, STATUS_BUSY, STATUS_INVALID_PARAMETER, STATUS_IO,
    STATUS_NOT_FOUND, STATUS_OK, STATUS_UNAVAILABLE,
};
pub use memory::MemoryBackend;
pub use records::{ModelRecord, PipelineRecord, ResourceRecord};
