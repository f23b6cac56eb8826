//! The model interface module.

use tracing::{debug, error, warn};

use super::{ModuleContext, ModuleError, ModuleOps};
use crate::ipc::endpoint::{attach_handlers, detach_handlers};
use crate::ipc::{MODEL_INTERFACE, MODEL_OBJECT_PATH};

pub static MODEL_MODULE: ModuleOps = ModuleOps {
    name: "model-interface",
    probe: probe_model_module,
    init: init_model_module,
    exit: exit_model_module,
};

fn probe_model_module(ctx: &mut ModuleContext) -> Result<(), ModuleError> {
    debug!("probe_model_module");

    let mut service = ctx.bus_mut().acquire(MODEL_INTERFACE).map_err(|e| {
        error!(interface = MODEL_INTERFACE, error = %e, "cannot get a service object");
        e
    })?;

    if let Err(e) = attach_handlers(&mut service, ctx.backend()) {
        error!(error = %e, "cannot attach the method handlers");
        return Err(e.into());
    }

    if let Err(e) = ctx.bus_mut().export(&service, MODEL_OBJECT_PATH) {
        error!(
            interface = MODEL_INTERFACE,
            object_path = MODEL_OBJECT_PATH,
            error = %e,
            "cannot export the interface"
        );
        detach_handlers(&mut service);
        return Err(e.into());
    }

    ctx.insert_service(MODEL_OBJECT_PATH, service);
    Ok(())
}

fn init_model_module(ctx: &mut ModuleContext) {
    ctx.bus_mut().initialize();
}

fn exit_model_module(ctx: &mut ModuleContext) {
    let Some(mut service) = ctx.take_service(MODEL_OBJECT_PATH) else {
        return;
    };
    detach_handlers(&mut service);
    if let Err(e) = ctx.bus_mut().unexport(MODEL_OBJECT_PATH) {
        warn!(error = %e, "model interface was not exported");
    }
}
