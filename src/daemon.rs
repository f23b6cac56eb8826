//! Daemon context: modules plus the state they share.

use std::sync::Arc;

use tracing::info;

use crate::ipc::{BusMessage, MethodReply, ServiceBus};
use crate::modules::{ModuleContext, ModuleRegistry, ModuleState};
use crate::registry::RegistrationBackend;

/// Owns the module registry and the shared module context.
///
/// Lifecycle transitions only happen in `start` and `stop`, while no calls
/// are being dispatched.
pub struct Daemon {
    ctx: ModuleContext,
    modules: ModuleRegistry,
}

impl Daemon {
    pub fn new(bus: Box<dyn ServiceBus>, backend: Arc<dyn RegistrationBackend>) -> Self {
        Self::with_modules(bus, backend, ModuleRegistry::builtin())
    }

    pub fn with_modules(
        bus: Box<dyn ServiceBus>,
        backend: Arc<dyn RegistrationBackend>,
        modules: ModuleRegistry,
    ) -> Self {
        Self {
            ctx: ModuleContext::new(bus, backend),
            modules,
        }
    }

    /// Probe and init every module. Returns the number of enabled modules.
    pub fn start(&mut self) -> usize {
        let enabled = self.modules.probe_all(&mut self.ctx);
        self.modules.init_all(&mut self.ctx);
        info!(enabled, "daemon modules started");
        enabled
    }

    pub fn stop(&mut self) {
        self.modules.exit_all(&mut self.ctx);
        info!("daemon modules stopped");
    }

    pub fn dispatch(&self, message: &BusMessage) -> MethodReply {
        self.ctx.dispatch(message)
    }

    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.modules.state(name)
    }

    pub fn context(&self) -> &ModuleContext {
        &self.ctx
    }
}
