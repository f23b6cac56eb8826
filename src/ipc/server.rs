//! Unix socket front end of the daemon.
//!
//! Each connection carries framed request/reply pairs. Calls from all
//! connections are dispatched one at a time through the daemon lock.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::connections::ConnectionLimiter;
use super::frame::{read_frame, write_frame};
use super::protocol::{decode_message, encode_message, MethodReply};
use crate::daemon::Daemon;
use crate::registry::{STATUS_INVALID_PARAMETER, STATUS_UNAVAILABLE};
use crate::shutdown::ShutdownCoordinator;

/// Socket server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    pub max_frame_size: usize,
    pub max_connections: usize,
}

/// Accept connections until `stop` flips, then remove the socket file.
pub async fn run_server(
    config: ServerConfig,
    daemon: Arc<Mutex<Daemon>>,
    shutdown: ShutdownCoordinator,
    mut stop: watch::Receiver<bool>,
) -> io::Result<()> {
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)?;
    let limiter = Arc::new(ConnectionLimiter::new(config.max_connections));
    info!(socket = %config.socket_path.display(), "listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let Some(slot) = ConnectionLimiter::try_acquire(&limiter) else {
                    warn!(max = limiter.max(), "connection limit reached, dropping client");
                    continue;
                };
                let daemon = Arc::clone(&daemon);
                let shutdown = shutdown.clone();
                let max = config.max_frame_size;
                tokio::spawn(async move {
                    let _slot = slot;
                    if let Err(e) = serve_connection(stream, daemon, shutdown, max).await {
                        debug!(error = %e, "connection closed with error");
                    }
                });
            }
            _ = stop.changed() => break,
        }
    }

    if let Err(e) = std::fs::remove_file(&config.socket_path) {
        debug!(error = %e, "cannot remove socket file");
    }
    Ok(())
}

async fn serve_connection(
    mut stream: UnixStream,
    daemon: Arc<Mutex<Daemon>>,
    shutdown: ShutdownCoordinator,
    max: usize,
) -> io::Result<()> {
    while let Some(body) = read_frame(&mut stream, max).await? {
        let reply = match shutdown.track() {
            Some(_guard) => handle_frame(&body, &daemon, max),
            None => MethodReply::Error {
                status: STATUS_UNAVAILABLE,
                message: "daemon is shutting down".into(),
            },
        };
        let bytes = encode_message(&reply, max).or_else(|e| {
            let fallback = MethodReply::Error {
                status: STATUS_INVALID_PARAMETER,
                message: e.to_string(),
            };
            encode_message(&fallback, max)
        });
        let bytes = bytes.map_err(io::Error::other)?;
        write_frame(&mut stream, &bytes, max).await?;
    }
    Ok(())
}

fn handle_frame(body: &[u8], daemon: &Mutex<Daemon>, max: usize) -> MethodReply {
    match decode_message(body, max) {
        Ok(message) => {
            debug!(object_path = %message.object_path, method = message.call.event(), "dispatch");
            daemon.lock().dispatch(&message)
        }
        Err(e) => MethodReply::Error {
            status: STATUS_INVALID_PARAMETER,
            message: e.to_string(),
        },
    }
}
