//! Agent configuration loading from environment variables.
//!
//! All values are loaded from `MLOPS_AGENT_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without crashing;
//! each fallback is kept in [`EnvConfig::fallbacks`] so it can be logged once
//! logging is up.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `MLOPS_AGENT_SOCKET_PATH` | /run/mlops-agent/mlops-agent.sock | IPC socket |
//! | `MLOPS_AGENT_PACKAGE_DB` | /var/lib/mlops-agent/packages | Package metadata directory |
//! | `MLOPS_AGENT_FRAME_LIMIT` | 1048576 | Max IPC frame size (bytes) |
//! | `MLOPS_AGENT_MAX_CONNECTIONS` | 64 | Max concurrent IPC clients |
//! | `MLOPS_AGENT_SHUTDOWN_TIMEOUT` | 10 | Drain timeout (secs) |
//! | `MLOPS_AGENT_LOG_LEVEL` | info | Log filter directive |
//! | `MLOPS_AGENT_LOG_FORMAT` | json | `json` or `pretty` |
//! | `MLOPS_AGENT_LOG_FILE` | unset | Log file path |

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::ipc::{ServerConfig, DEFAULT_MAX_MESSAGE_SIZE};
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_SOCKET_PATH: &str = "/run/mlops-agent/mlops-agent.sock";
pub const DEFAULT_PACKAGE_DB: &str = "/var/lib/mlops-agent/packages";

const MIN_FRAME: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason}), using default")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key} is not valid UTF-8, using default")]
    NotUnicode { key: String },
}

/// All agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub socket_path: PathBuf,
    pub package_db: PathBuf,
    pub max_frame_size: usize,
    pub max_connections: usize,
    pub shutdown_timeout: Duration,
    pub log: LogConfig,
    /// Variables that were set but rejected.
    pub fallbacks: Vec<ConfigError>,
}

impl EnvConfig {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            socket_path: self.socket_path.clone(),
            max_frame_size: self.max_frame_size,
            max_connections: self.max_connections,
        }
    }
}

/// Parse `key` if set. `Ok(None)` when unset or empty.
fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let val = match std::env::var(key) {
        Ok(val) if val.trim().is_empty() => return Ok(None),
        Ok(val) => val,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            return Err(ConfigError::NotUnicode { key: key.to_string() })
        }
    };
    val.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: val.clone(),
            reason: e.to_string(),
        })
}

fn parse_or<T>(key: &str, default: T, fallbacks: &mut Vec<ConfigError>) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match parse_var(key) {
        Ok(val) => val.unwrap_or(default),
        Err(e) => {
            fallbacks.push(e);
            default
        }
    }
}

fn parse_path(key: &str, default: &str) -> PathBuf {
    std::env::var_os(key)
        .filter(|val| !val.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn load_log_config(fallbacks: &mut Vec<ConfigError>) -> LogConfig {
    let defaults = LogConfig::default();
    let level = parse_or("MLOPS_AGENT_LOG_LEVEL", defaults.level, fallbacks);
    let format = parse_or::<LogFormat>("MLOPS_AGENT_LOG_FORMAT", defaults.format, fallbacks);
    let output_path = std::env::var_os("MLOPS_AGENT_LOG_FILE")
        .filter(|val| !val.is_empty())
        .map(PathBuf::from);
    LogConfig {
        format,
        level,
        output_path,
    }
}

/// Load all configuration from environment variables.
pub fn load() -> EnvConfig {
    let mut fallbacks = Vec::new();
    let max_frame_size =
        parse_or("MLOPS_AGENT_FRAME_LIMIT", DEFAULT_MAX_MESSAGE_SIZE, &mut fallbacks);
    let max_connections = parse_or("MLOPS_AGENT_MAX_CONNECTIONS", 64usize, &mut fallbacks);
    let shutdown_secs = parse_or("MLOPS_AGENT_SHUTDOWN_TIMEOUT", 10u64, &mut fallbacks);
    let log = load_log_config(&mut fallbacks);

    EnvConfig {
        socket_path: parse_path("MLOPS_AGENT_SOCKET_PATH", DEFAULT_SOCKET_PATH),
        package_db: parse_path("MLOPS_AGENT_PACKAGE_DB", DEFAULT_PACKAGE_DB),
        max_frame_size: max_frame_size.max(MIN_FRAME),
        max_connections: max_connections.max(1),
        shutdown_timeout: Duration::from_secs(shutdown_secs.max(1)),
        log,
        fallbacks,
    }
}
