//! Tests for the model service endpoint dispatched through a running daemon.

use std::sync::Arc;

use mlops_agent::ipc::{BusMessage, LocalBus, MethodReply, ModelCall};
use mlops_agent::registry::{
    ModelRecord, STATUS_BUSY, STATUS_NOT_FOUND, STATUS_OK, STATUS_UNAVAILABLE,
};
use mlops_agent::{Daemon, MemoryBackend};

fn started() -> (Daemon, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let mut daemon = Daemon::new(Box::new(LocalBus::new()), backend.clone());
    assert_eq!(daemon.start(), 1);
    (daemon, backend)
}

fn call(daemon: &Daemon, call: ModelCall) -> MethodReply {
    daemon.dispatch(&BusMessage::model(call))
}

fn register(daemon: &Daemon, name: &str, path: &str, is_active: bool) -> u32 {
    let reply = call(
        daemon,
        ModelCall::Register {
            name: name.into(),
            path: path.into(),
            is_active,
            description: format!("{} model", name),
            app_info: "{}".into(),
        },
    );
    match reply {
        MethodReply::Version { version, status: STATUS_OK } => version,
        other => panic!("unexpected reply {:?}", other),
    }
}

fn info(reply: MethodReply) -> String {
    match reply {
        MethodReply::Info { info, status: STATUS_OK } => info,
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_register_then_get_round_trip() {
    let (daemon, _) = started();
    let version = register(&daemon, "mobilenet", "/models/mobilenet.tflite", true);
    assert_eq!(version, 1);

    let record: ModelRecord = serde_json::from_str(&info(call(
        &daemon,
        ModelCall::Get { name: "mobilenet".into(), version },
    )))
    .unwrap();
    assert_eq!(record.name, "mobilenet");
    assert_eq!(record.path, "/models/mobilenet.tflite");
    assert_eq!(record.description, "mobilenet model");
    assert!(record.active);
}

#[test]
fn test_versions_and_activation() {
    let (daemon, _) = started();
    assert_eq!(register(&daemon, "m", "/v1", true), 1);
    assert_eq!(register(&daemon, "m", "/v2", false), 2);

    let reply = call(&daemon, ModelCall::Activate { name: "m".into(), version: 2 });
    assert_eq!(reply, MethodReply::Status { status: STATUS_OK });

    let active: ModelRecord =
        serde_json::from_str(&info(call(&daemon, ModelCall::GetActivated { name: "m".into() })))
            .unwrap();
    assert_eq!(active.version, 2);

    let all: Vec<ModelRecord> =
        serde_json::from_str(&info(call(&daemon, ModelCall::GetAll { name: "m".into() })))
            .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|m| m.active).count(), 1);
}

#[test]
fn test_update_description() {
    let (daemon, _) = started();
    let version = register(&daemon, "m", "/m", false);
    let reply = call(
        &daemon,
        ModelCall::UpdateDescription {
            name: "m".into(),
            version,
            description: "updated".into(),
        },
    );
    assert!(reply.is_success());
    let record: ModelRecord =
        serde_json::from_str(&info(call(&daemon, ModelCall::Get { name: "m".into(), version })))
            .unwrap();
    assert_eq!(record.description, "updated");
}

#[test]
fn test_backend_status_is_forwarded() {
    let (daemon, _) = started();
    let reply = call(&daemon, ModelCall::Get { name: "missing".into(), version: 1 });
    assert_eq!(
        reply,
        MethodReply::Info {
            info: String::new(),
            status: STATUS_NOT_FOUND,
        }
    );

    let version = register(&daemon, "m", "/m", true);
    let delete = |force| {
        call(
            &daemon,
            ModelCall::Delete {
                name: "m".into(),
                version,
                force,
            },
        )
    };
    assert_eq!(delete(false).status(), STATUS_BUSY);
    assert_eq!(delete(true).status(), STATUS_OK);
    assert_eq!(delete(true).status(), STATUS_NOT_FOUND);
}

#[test]
fn test_pipeline_and_resource_reach_backend() {
    let (daemon, backend) = started();
    let reply = call(
        &daemon,
        ModelCall::SetPipelineDescription {
            name: "p".into(),
            description: "videotestsrc ! fakesink".into(),
        },
    );
    assert!(reply.is_success());
    assert_eq!(backend.pipeline("p").unwrap().description, "videotestsrc ! fakesink");

    for path in ["/r/a", "/r/b"] {
        let reply = call(
            &daemon,
            ModelCall::AddResource {
                name: "r".into(),
                path: path.into(),
                description: String::new(),
                app_info: "{}".into(),
            },
        );
        assert!(reply.is_success());
    }
    assert_eq!(backend.resources("r").len(), 2);
}

#[test]
fn test_unknown_object_path() {
    let (daemon, _) = started();
    let reply = daemon.dispatch(&BusMessage {
        object_path: "/Org/Example/Nothing".into(),
        call: ModelCall::GetAll { name: "m".into() },
    });
    assert!(matches!(reply, MethodReply::Error { status: STATUS_UNAVAILABLE, .. }));
}
