//! Process-side service bus.
//!
//! A `ServiceObject` is the skeleton of one exported interface: it holds the
//! handlers attached to its event names. The `ServiceBus` hands out service
//! objects and publishes them at object paths.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::debug;

use super::protocol::{MethodReply, ModelCall};
use crate::registry::STATUS_UNAVAILABLE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Service object for '{0}' is unavailable")]
    Unavailable(String),

    #[error("Handler already attached to event '{0}'")]
    AlreadyAttached(String),

    #[error("Object path '{0}' is already exported")]
    PathInUse(String),

    #[error("Object path '{0}' is not exported")]
    NotExported(String),
}

/// Identifier of an attached handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub type Handler = Box<dyn Fn(&ModelCall) -> MethodReply + Send + Sync>;

struct Attached {
    id: HandlerId,
    handler: Handler,
}

/// Skeleton of one interface with its attached method handlers.
pub struct ServiceObject {
    interface: String,
    handlers: BTreeMap<&'static str, Attached>,
    next_id: u64,
}

impl ServiceObject {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            handlers: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Attach `handler` to `event`. Fails if the event already has one.
    pub fn attach(&mut self, event: &'static str, handler: Handler) -> Result<HandlerId, BusError> {
        if self.handlers.contains_key(event) {
            return Err(BusError::AlreadyAttached(event.to_string()));
        }
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.insert(event, Attached { id, handler });
        Ok(id)
    }

    /// Detach the handler of `event`. Detaching an absent event is a no-op.
    pub fn detach(&mut self, event: &str) -> Option<HandlerId> {
        self.handlers.remove(event).map(|attached| attached.id)
    }

    pub fn is_attached(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run the handler bound to the call's event.
    pub fn invoke(&self, call: &ModelCall) -> MethodReply {
        match self.handlers.get(call.event()) {
            Some(attached) => (attached.handler)(call),
            None => MethodReply::Error {
                status: STATUS_UNAVAILABLE,
                message: format!("no handler for '{}' on {}", call.event(), self.interface),
            },
        }
    }
}

/// The IPC subsystem as seen by modules.
pub trait ServiceBus: Send {
    /// One-time, idempotent bootstrap of the subsystem.
    fn initialize(&mut self);

    /// Create the service object for `interface`.
    fn acquire(&mut self, interface: &str) -> Result<ServiceObject, BusError>;

    /// Publish `service` at `object_path`.
    fn export(&mut self, service: &ServiceObject, object_path: &str) -> Result<(), BusError>;

    /// Withdraw whatever is published at `object_path`.
    fn unexport(&mut self, object_path: &str) -> Result<(), BusError>;
}

/// In-process bus used by the daemon. Only tracks which paths are published.
#[derive(Debug, Default)]
pub struct LocalBus {
    initialized: bool,
    exported: HashSet<String>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_exported(&self, object_path: &str) -> bool {
        self.exported.contains(object_path)
    }
}

impl ServiceBus for LocalBus {
    fn initialize(&mut self) {
        if !self.initialized {
            debug!("local bus initialized");
            self.initialized = true;
        }
    }

    fn acquire(&mut self, interface: &str) -> Result<ServiceObject, BusError> {
        Ok(ServiceObject::new(interface))
    }

    fn export(&mut self, service: &ServiceObject, object_path: &str) -> Result<(), BusError> {
        if !self.exported.insert(object_path.to_string()) {
            return Err(BusError::PathInUse(object_path.to_string()));
        }
        debug!(interface = service.interface(), object_path, "service exported");
        Ok(())
    }

    fn unexport(&mut self, object_path: &str) -> Result<(), BusError> {
        if self.exported.remove(object_path) {
            Ok(())
        } else {
            Err(BusError::NotExported(object_path.to_string()))
        }
    }
}
