//! Wire format for model interface calls.
//!
//! # Security
//! - Message size limits prevent memory exhaustion attacks
//! - Size is checked before parsing

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::Status;

/// Interface name of the model service.
pub const MODEL_INTERFACE: &str = "org.tizen.machinelearning.service.model";

/// Object path the model service is exported at.
pub const MODEL_OBJECT_PATH: &str = "/Org/Tizen/MachineLearning/Service/Model";

/// Event names the model handlers are bound to.
pub mod events {
    pub const REGISTER: &str = "handle-register";
    pub const UPDATE_DESCRIPTION: &str = "handle-update-description";
    pub const ACTIVATE: &str = "handle-activate";
    pub const GET: &str = "handle-get";
    pub const GET_ACTIVATED: &str = "handle-get-activated";
    pub const GET_ALL: &str = "handle-get-all";
    pub const DELETE: &str = "handle-delete";
    pub const SET_PIPELINE_DESCRIPTION: &str = "handle-set-pipeline-description";
    pub const ADD_RESOURCE: &str = "handle-add-resource";
}

/// Default upper bound for one encoded message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// A model interface method call with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ModelCall {
    #[serde(rename = "handle-register")]
    Register {
        name: String,
        path: String,
        is_active: bool,
        #[serde(default)]
        description: String,
        #[serde(default)]
        app_info: String,
    },

    #[serde(rename = "handle-update-description")]
    UpdateDescription {
        name: String,
        version: u32,
        description: String,
    },

    #[serde(rename = "handle-activate")]
    Activate { name: String, version: u32 },

    #[serde(rename = "handle-get")]
    Get { name: String, version: u32 },

    #[serde(rename = "handle-get-activated")]
    GetActivated { name: String },

    #[serde(rename = "handle-get-all")]
    GetAll { name: String },

    #[serde(rename = "handle-delete")]
    Delete {
        name: String,
        version: u32,
        #[serde(default)]
        force: bool,
    },

    #[serde(rename = "handle-set-pipeline-description")]
    SetPipelineDescription { name: String, description: String },

    #[serde(rename = "handle-add-resource")]
    AddResource {
        name: String,
        path: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        app_info: String,
    },
}

impl ModelCall {
    /// Event name the call is dispatched on.
    pub fn event(&self) -> &'static str {
        match self {
            ModelCall::Register { .. } => events::REGISTER,
            ModelCall::UpdateDescription { .. } => events::UPDATE_DESCRIPTION,
            ModelCall::Activate { .. } => events::ACTIVATE,
            ModelCall::Get { .. } => events::GET,
            ModelCall::GetActivated { .. } => events::GET_ACTIVATED,
            ModelCall::GetAll { .. } => events::GET_ALL,
            ModelCall::Delete { .. } => events::DELETE,
            ModelCall::SetPipelineDescription { .. } => events::SET_PIPELINE_DESCRIPTION,
            ModelCall::AddResource { .. } => events::ADD_RESOURCE,
        }
    }
}

/// A call addressed to an exported object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMessage {
    pub object_path: String,
    pub call: ModelCall,
}

impl BusMessage {
    /// Address `call` to the model service.
    pub fn model(call: ModelCall) -> Self {
        Self {
            object_path: MODEL_OBJECT_PATH.to_string(),
            call,
        }
    }
}

/// Completion of a method invocation.
///
/// Handler replies always carry a status; `Error` is produced by the bus
/// itself when no handler could be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodReply {
    Status { status: Status },
    Version { version: u32, status: Status },
    Info { info: String, status: Status },
    Error { status: Status, message: String },
}

impl MethodReply {
    pub fn status(&self) -> Status {
        match self {
            MethodReply::Status { status }
            | MethodReply::Version { status, .. }
            | MethodReply::Info { status, .. }
            | MethodReply::Error { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == 0
    }
}

/// Encode a value to JSON bytes with size limit enforcement.
pub fn encode_message<T: Serialize>(message: &T, max: usize) -> Result<Vec<u8>, ProtocolError> {
    let bytes = serde_json::to_vec(message)?;
    if bytes.len() > max {
        return Err(ProtocolError::MessageTooLarge {
            size: bytes.len(),
            max,
        });
    }
    Ok(bytes)
}

/// Decode a bus message from JSON bytes.
///
/// # Security
/// Size check happens BEFORE parsing to prevent allocation attacks.
pub fn decode_message(bytes: &[u8], max: usize) -> Result<BusMessage, ProtocolError> {
    if bytes.len() > max {
        return Err(ProtocolError::MessageTooLarge {
            size: bytes.len(),
            max,
        });
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a reply from JSON bytes.
pub fn decode_reply(bytes: &[u8], max: usize) -> Result<MethodReply, ProtocolError> {
    if bytes.len() > max {
        return Err(ProtocolError::MessageTooLarge {
            size: bytes.len(),
            max,
        });
    }
    Ok(serde_json::from_slice(bytes)?)
}
