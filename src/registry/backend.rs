//! The registration backend trait and its status codes.

use thiserror::Error;

/// Signed status code exchanged with IPC callers. Zero means success.
pub type Status = i32;

pub const STATUS_OK: Status = 0;
pub const STATUS_NOT_FOUND: Status = -2;
pub const STATUS_IO: Status = -5;
pub const STATUS_BUSY: Status = -16;
pub const STATUS_INVALID_PARAMETER: Status = -22;
pub const STATUS_UNAVAILABLE: Status = -38;

/// A non-zero status returned by the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("backend status {code}: {message}")]
pub struct BackendError {
    code: Status,
    message: String,
}

impl BackendError {
    pub fn new(code: Status, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(STATUS_INVALID_PARAMETER, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(STATUS_NOT_FOUND, message)
    }

    /// Status code forwarded verbatim to IPC callers.
    pub fn code(&self) -> Status {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Registration and query operations of the model registry.
///
/// Each operation maps one-to-one onto an IPC method and onto one manifest
/// entry kind. Record payloads (`get_*`) are serialized JSON strings; the
/// backend decides their exact shape.
pub trait RegistrationBackend: Send + Sync {
    /// Register a model version. Returns the version assigned by the backend.
    fn add_model(
        &self,
        name: &str,
        path: &str,
        active: bool,
        description: &str,
        app_info: &str,
    ) -> Result<u32, BackendError>;

    fn update_model_description(
        &self,
        name: &str,
        version: u32,
        description: &str,
    ) -> Result<(), BackendError>;

    /// Activate one version. Other versions of the same name are deactivated.
    fn activate_model(&self, name: &str, version: u32) -> Result<(), BackendError>;

    fn get_model(&self, name: &str, version: u32) -> Result<String, BackendError>;

    fn get_activated_model(&self, name: &str) -> Result<String, BackendError>;

    /// All versions registered under `name`.
    fn get_all_models(&self, name: &str) -> Result<String, BackendError>;

    /// Delete a version. `force` bypasses the in-use check.
    fn delete_model(&self, name: &str, version: u32, force: bool) -> Result<(), BackendError>;

    /// Insert or replace the description of a pipeline.
    fn set_pipeline_description(&self, name: &str, description: &str)
        -> Result<(), BackendError>;

    fn add_resource(
        &self,
        name: &str,
        path: &str,
        description: &str,
        app_info: &str,
    ) -> Result<(), BackendError>;
}
