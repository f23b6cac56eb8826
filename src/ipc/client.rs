//! Blocking client for the daemon socket.
//!
//! `SocketBackend` is the registration API used by the installer: every
//! backend operation becomes one call on the model interface.

use std::io;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::debug;

use super::frame::{read_frame_blocking, write_frame_blocking};
use super::protocol::{decode_reply, encode_message, BusMessage, MethodReply, ModelCall};
use crate::registry::{BackendError, RegistrationBackend, STATUS_IO, STATUS_OK};

/// Registration backend reached through a running daemon.
pub struct SocketBackend {
    socket_path: PathBuf,
    max_frame_size: usize,
    stream: Mutex<Option<UnixStream>>,
}

impl SocketBackend {
    pub fn new(socket_path: impl Into<PathBuf>, max_frame_size: usize) -> Self {
        Self {
            socket_path: socket_path.into(),
            max_frame_size,
            stream: Mutex::new(None),
        }
    }

    /// Send one call and wait for its reply. The connection is opened on
    /// first use and dropped after any transport error.
    pub fn call(&self, call: ModelCall) -> Result<MethodReply, BackendError> {
        let request = encode_message(&BusMessage::model(call), self.max_frame_size)
            .map_err(|e| BackendError::invalid_parameter(e.to_string()))?;

        let mut guard = self.stream.lock();
        let result = self.exchange(&mut guard, &request);
        if result.is_err() {
            *guard = None;
        }
        let body = result.map_err(|e| {
            BackendError::new(
                STATUS_IO,
                format!("{}: {}", self.socket_path.display(), e),
            )
        })?;
        decode_reply(&body, self.max_frame_size)
            .map_err(|e| BackendError::new(STATUS_IO, format!("malformed reply: {}", e)))
    }

    fn exchange(&self, slot: &mut Option<UnixStream>, request: &[u8]) -> io::Result<Vec<u8>> {
        if slot.is_none() {
            debug!(socket = %self.socket_path.display(), "connecting");
            *slot = Some(UnixStream::connect(&self.socket_path)?);
        }
        let stream = slot
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no connection"))?;
        write_frame_blocking(stream, request, self.max_frame_size)?;
        read_frame_blocking(stream, self.max_frame_size)
    }
}

fn failure(status: i32, message: String) -> Result<(), BackendError> {
    if status == STATUS_OK {
        Ok(())
    } else {
        Err(BackendError::new(status, message))
    }
}

fn unexpected(reply: &MethodReply) -> BackendError {
    BackendError::new(STATUS_IO, format!("unexpected reply: {:?}", reply))
}

fn expect_status(reply: MethodReply) -> Result<(), BackendError> {
    match reply {
        MethodReply::Status { status } => failure(status, "call failed".into()),
        MethodReply::Error { status, message } => Err(BackendError::new(status, message)),
        other => Err(unexpected(&other)),
    }
}

fn expect_info(reply: MethodReply) -> Result<String, BackendError> {
    match reply {
        MethodReply::Info { info, status } => failure(status, "lookup failed".into()).map(|_| info),
        MethodReply::Error { status, message } => Err(BackendError::new(status, message)),
        other => Err(unexpected(&other)),
    }
}

impl RegistrationBackend for SocketBackend {
    fn add_model(
        &self,
        name: &str,
        path: &str,
        active: bool,
        description: &str,
        app_info: &str,
    ) -> Result<u32, BackendError> {
        let reply = self.call(ModelCall::Register {
            name: name.to_string(),
            path: path.to_string(),
            is_active: active,
            description: description.to_string(),
            app_info: app_info.to_string(),
        })?;
        match reply {
            MethodReply::Version { version, status } => {
                failure(status, "register failed".into()).map(|_| version)
            }
            MethodReply::Error { status, message } => Err(BackendError::new(status, message)),
            other => Err(unexpected(&other)),
        }
    }

    fn update_model_description(
        &self,
        name: &str,
        version: u32,
        description: &str,
    ) -> Result<(), BackendError> {
        expect_status(self.call(ModelCall::UpdateDescription {
            name: name.to_string(),
            version,
            description: description.to_string(),
        })?)
    }

    fn activate_model(&self, name: &str, version: u32) -> Result<(), BackendError> {
        expect_status(self.call(ModelCall::Activate {
            name: name.to_string(),
            version,
        })?)
    }

    fn get_model(&self, name: &str, version: u32) -> Result<String, BackendError> {
        expect_info(self.call(ModelCall::Get {
            name: name.to_string(),
            version,
        })?)
    }

    fn get_activated_model(&self, name: &str) -> Result<String, BackendError> {
        expect_info(self.call(ModelCall::GetActivated {
            name: name.to_string(),
        })?)
    }

    fn get_all_models(&self, name: &str) -> Result<String, BackendError> {
        expect_info(self.call(ModelCall::GetAll {
            name: name.to_string(),
        })?)
    }

    fn delete_model(&self, name: &str, version: u32, force: bool) -> Result<(), BackendError> {
        expect_status(self.call(ModelCall::Delete {
            name: name.to_string(),
            version,
            force,
        })?)
    }

    fn set_pipeline_description(
        &self,
        name: &str,
        description: &str,
    ) -> Result<(), BackendError> {
        expect_status(self.call(ModelCall::SetPipelineDescription {
            name: name.to_string(),
            description: description.to_string(),
        })?)
    }

    fn add_resource(
        &self,
        name: &str,
        path: &str,
        description: &str,
        app_info: &str,
    ) -> Result<(), BackendError> {
        expect_status(self.call(ModelCall::AddResource {
            name: name.to_string(),
            path: path.to_string(),
            description: description.to_string(),
            app_info: app_info.to_string(),
        })?)
    }
}
