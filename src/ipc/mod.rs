//! IPC module for the MLOps agent.
//!
//! Model interface calls arrive framed on a Unix socket, are decoded into
//! `ModelCall`s and dispatched to the service object exported at the
//! call's object path.

mod bus;
mod client;
mod connections;
pub mod endpoint;
pub mod frame;
pub mod protocol;
pub mod server;

pub use bus::{BusError, Handler, HandlerId, LocalBus, ServiceBus, ServiceObject};
pub use client::SocketBackend;
pub use connections::{ConnectionLimiter, ConnectionSlot};
pub use protocol::{
    decode_message, decode_reply, encode_message, events, BusMessage, MethodReply, ModelCall,
    ProtocolError, DEFAULT_MAX_MESSAGE_SIZE, MODEL_INTERFACE, MODEL_OBJECT_PATH,
};
pub use server::{run_server, ServerConfig};
