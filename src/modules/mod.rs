//! Daemon module registry and lifecycle.
//!
//! Each module announces itself with a name and three hooks. At startup the
//! daemon probes every module, disables those whose probe fails and inits the
//! rest; at shutdown it runs `exit` on every module that was probed.
//!
//! ```text
//! Unregistered --probe--> Probed --init--> Active --exit--> TornDown
//! ```

mod model;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ipc::{BusError, BusMessage, MethodReply, ServiceBus, ServiceObject};
use crate::registry::{RegistrationBackend, Status, STATUS_UNAVAILABLE};

pub use model::MODEL_MODULE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("Service unavailable: {0}")]
    Unavailable(#[from] BusError),
}

impl ModuleError {
    /// Status reported for a disabled module.
    pub fn status(&self) -> Status {
        STATUS_UNAVAILABLE
    }
}

/// Lifecycle hooks of one module.
pub struct ModuleOps {
    pub name: &'static str,
    pub probe: fn(&mut ModuleContext) -> Result<(), ModuleError>,
    pub init: fn(&mut ModuleContext),
    pub exit: fn(&mut ModuleContext),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unregistered,
    Probed,
    Active,
    TornDown,
}

/// State shared by all modules: the bus, the backend and the exported
/// service objects keyed by object path.
pub struct ModuleContext {
    bus: Box<dyn ServiceBus>,
    backend: Arc<dyn RegistrationBackend>,
    services: BTreeMap<String, ServiceObject>,
}

impl ModuleContext {
    pub fn new(bus: Box<dyn ServiceBus>, backend: Arc<dyn RegistrationBackend>) -> Self {
        Self {
            bus,
            backend,
            services: BTreeMap::new(),
        }
    }

    pub fn bus_mut(&mut self) -> &mut dyn ServiceBus {
        self.bus.as_mut()
    }

    pub fn backend(&self) -> Arc<dyn RegistrationBackend> {
        Arc::clone(&self.backend)
    }

    /// Keep an exported service object so calls can be dispatched into it.
    pub fn insert_service(&mut self, object_path: &str, service: ServiceObject) {
        self.services.insert(object_path.to_string(), service);
    }

    pub fn take_service(&mut self, object_path: &str) -> Option<ServiceObject> {
        self.services.remove(object_path)
    }

    pub fn service(&self, object_path: &str) -> Option<&ServiceObject> {
        self.services.get(object_path)
    }

    /// Route a call to the service exported at its object path.
    pub fn dispatch(&self, message: &BusMessage) -> MethodReply {
        match self.services.get(&message.object_path) {
            Some(service) => service.invoke(&message.call),
            None => MethodReply::Error {
                status: STATUS_UNAVAILABLE,
                message: format!("no object at '{}'", message.object_path),
            },
        }
    }
}

struct ModuleEntry {
    ops: &'static ModuleOps,
    state: ModuleState,
}

/// Ordered list of the daemon's modules and their lifecycle state.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module built into the daemon.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(&MODEL_MODULE);
        registry
    }

    pub fn register(&mut self, ops: &'static ModuleOps) {
        self.entries.push(ModuleEntry {
            ops,
            state: ModuleState::Unregistered,
        });
    }

    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.entries
            .iter()
            .find(|entry| entry.ops.name == name)
            .map(|entry| entry.state)
    }

    /// Probe every unregistered module. Returns how many are enabled.
    ///
    /// A failed probe disables that module only.
    pub fn probe_all(&mut self, ctx: &mut ModuleContext) -> usize {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.state == ModuleState::Unregistered)
        {
            debug!(module = entry.ops.name, "probing module");
            match (entry.ops.probe)(ctx) {
                Ok(()) => entry.state = ModuleState::Probed,
                Err(e) => warn!(
                    module = entry.ops.name,
                    status = e.status(),
                    error = %e,
                    "module disabled"
                ),
            }
        }
        self.entries
            .iter()
            .filter(|e| e.state == ModuleState::Probed)
            .count()
    }

    pub fn init_all(&mut self, ctx: &mut ModuleContext) {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.state == ModuleState::Probed)
        {
            (entry.ops.init)(ctx);
            entry.state = ModuleState::Active;
            info!(module = entry.ops.name, "module active");
        }
    }

    pub fn exit_all(&mut self, ctx: &mut ModuleContext) {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| matches!(e.state, ModuleState::Probed | ModuleState::Active))
        {
            (entry.ops.exit)(ctx);
            entry.state = ModuleState::TornDown;
            info!(module = entry.ops.name, "module torn down");
        }
    }
}
