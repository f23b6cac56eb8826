//! Model service endpoint: binds model interface events to backend calls.
//!
//! Every handler calls exactly one backend operation and completes the
//! invocation with its payload and status. Backend failures become the
//! status; a reply is always produced.

use std::sync::Arc;

use tracing::debug;

use super::bus::{BusError, ServiceObject};
use super::protocol::{events, MethodReply, ModelCall};
use crate::registry::{BackendError, RegistrationBackend, Status, STATUS_INVALID_PARAMETER, STATUS_OK};

type HandlerFn = fn(&dyn RegistrationBackend, &ModelCall) -> MethodReply;

/// One row of the handler table.
pub struct HandlerSpec {
    pub event: &'static str,
    handler: HandlerFn,
}

/// Event/handler pairs of the model interface.
pub static HANDLER_TABLE: &[HandlerSpec] = &[
    HandlerSpec { event: events::REGISTER, handler: handle_register },
    HandlerSpec { event: events::UPDATE_DESCRIPTION, handler: handle_update_description },
    HandlerSpec { event: events::ACTIVATE, handler: handle_activate },
    HandlerSpec { event: events::GET, handler: handle_get },
    HandlerSpec { event: events::GET_ACTIVATED, handler: handle_get_activated },
    HandlerSpec { event: events::GET_ALL, handler: handle_get_all },
    HandlerSpec { event: events::DELETE, handler: handle_delete },
    HandlerSpec { event: events::SET_PIPELINE_DESCRIPTION, handler: handle_set_pipeline_description },
    HandlerSpec { event: events::ADD_RESOURCE, handler: handle_add_resource },
];

/// Attach every handler of the table to `service`.
///
/// On failure the handlers attached so far are detached again, so the
/// service never keeps a partial table.
pub fn attach_handlers(
    service: &mut ServiceObject,
    backend: Arc<dyn RegistrationBackend>,
) -> Result<(), BusError> {
    for spec in HANDLER_TABLE {
        let backend = Arc::clone(&backend);
        let handler = spec.handler;
        let attached = service.attach(
            spec.event,
            Box::new(move |call: &ModelCall| handler(backend.as_ref(), call)),
        );
        if let Err(e) = attached {
            detach_handlers(service);
            return Err(e);
        }
    }
    Ok(())
}

/// Detach every handler of the table from `service`.
pub fn detach_handlers(service: &mut ServiceObject) {
    for spec in HANDLER_TABLE {
        if let Some(id) = service.detach(spec.event) {
            debug!(event = spec.event, ?id, "handler detached");
        }
    }
}

fn status_of(result: Result<(), BackendError>) -> Status {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => {
            debug!(error = %e, "backend call failed");
            e.code()
        }
    }
}

fn info_reply(result: Result<String, BackendError>) -> MethodReply {
    match result {
        Ok(info) => MethodReply::Info { info, status: STATUS_OK },
        Err(e) => MethodReply::Info {
            info: String::new(),
            status: e.code(),
        },
    }
}

fn mismatched(call: &ModelCall) -> MethodReply {
    MethodReply::Error {
        status: STATUS_INVALID_PARAMETER,
        message: format!("arguments do not match handler for '{}'", call.event()),
    }
}

fn handle_register(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::Register { name, path, is_active, description, app_info } = call else {
        return mismatched(call);
    };
    match backend.add_model(name, path, *is_active, description, app_info) {
        Ok(version) => MethodReply::Version { version, status: STATUS_OK },
        Err(e) => MethodReply::Version { version: 0, status: e.code() },
    }
}

fn handle_update_description(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::UpdateDescription { name, version, description } = call else {
        return mismatched(call);
    };
    MethodReply::Status {
        status: status_of(backend.update_model_description(name, *version, description)),
    }
}

fn handle_activate(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::Activate { name, version } = call else {
        return mismatched(call);
    };
    MethodReply::Status {
        status: status_of(backend.activate_model(name, *version)),
    }
}

fn handle_get(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::Get { name, version } = call else {
        return mismatched(call);
    };
    info_reply(backend.get_model(name, *version))
}

fn handle_get_activated(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::GetActivated { name } = call else {
        return mismatched(call);
    };
    info_reply(backend.get_activated_model(name))
}

fn handle_get_all(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::GetAll { name } = call else {
        return mismatched(call);
    };
    info_reply(backend.get_all_models(name))
}

fn handle_delete(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::Delete { name, version, force } = call else {
        return mismatched(call);
    };
    MethodReply::Status {
        status: status_of(backend.delete_model(name, *version, *force)),
    }
}

fn handle_set_pipeline_description(
    backend: &dyn RegistrationBackend,
    call: &ModelCall,
) -> MethodReply {
    let ModelCall::SetPipelineDescription { name, description } = call else {
        return mismatched(call);
    };
    MethodReply::Status {
        status: status_of(backend.set_pipeline_description(name, description)),
    }
}

fn handle_add_resource(backend: &dyn RegistrationBackend, call: &ModelCall) -> MethodReply {
    let ModelCall::AddResource { name, path, description, app_info } = call else {
        return mismatched(call);
    };
    MethodReply::Status {
        status: status_of(backend.add_resource(name, path, description, app_info)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryBackend;

    #[test]
    fn table_covers_every_event_once() {
        let mut events: Vec<&str> = HANDLER_TABLE.iter().map(|s| s.event).collect();
        events.sort_unstable();
        events.dedup();
        assert_eq!(events.len(), 9);
    }

    #[test]
    fn mismatched_arguments_are_reported() {
        let backend = MemoryBackend::new();
        let reply = handle_get(&backend, &ModelCall::GetAll { name: "m".into() });
        assert_eq!(reply.status(), STATUS_INVALID_PARAMETER);
    }

    #[test]
    fn partial_attach_is_unwound() {
        let mut service = ServiceObject::new("test");
        service
            .attach(events::DELETE, Box::new(|_| MethodReply::Status { status: 0 }))
            .unwrap();

        let backend: Arc<dyn RegistrationBackend> = Arc::new(MemoryBackend::new());
        let err = attach_handlers(&mut service, backend).unwrap_err();
        assert_eq!(err, BusError::AlreadyAttached(events::DELETE.to_string()));
        assert_eq!(service.handler_count(), 0);
    }
}
