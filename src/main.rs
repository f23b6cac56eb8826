//! MLOps agent entry point.
//!
//! ## CLI Subcommands
//!
//! - `mlops-agent` or `mlops-agent serve` - Run the model registry daemon (default)
//! - `mlops-agent plugin <HOOK> <PKGID> [APPID]` - Run a package-manager hook
//! - `mlops-agent parse <MANIFEST>` - Register a manifest with the running daemon

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use mlops_agent::config::{self as agent_config, EnvConfig};
use mlops_agent::installer::{HookArgs, ManifestParser, Metadata, PluginHook, RpkInstaller, TomlPackageDb};
use mlops_agent::ipc::{run_server, LocalBus, SocketBackend};
use mlops_agent::shutdown::{DrainResult, ShutdownCoordinator};
use mlops_agent::telemetry::init_logging;
use mlops_agent::{Daemon, MemoryBackend, RegistrationBackend};

const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "help" | "--help" | "-h" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "version" | "--version" | "-V" => {
            println!("mlops-agent {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let config = agent_config::load();
    if let Err(e) = init_logging(&config.log) {
        eprintln!("Logging setup failed: {}", e);
        return ExitCode::from(EXIT_USAGE);
    }
    for fallback in &config.fallbacks {
        warn!(error = %fallback, "configuration fallback");
    }

    match command {
        "serve" | "" => match run_daemon(&config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "daemon failed");
                ExitCode::FAILURE
            }
        },
        "plugin" => run_plugin(&config, &args[2..]),
        "parse" => run_parse(&config, &args[2..]),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn print_usage() {
    eprintln!(
        "mlops-agent {} - model registry daemon and RPK installer

USAGE:
    mlops-agent [COMMAND] [OPTIONS]

COMMANDS:
    serve                              Run the daemon (default)
    plugin <HOOK> <PKGID> [APPID]      Run a package-manager hook
        [--metadata KEY=VALUE]...      Metadata passed by the package manager
    parse <MANIFEST> [--app-info JSON] Register a manifest with the daemon
    version                            Show version information
    help                               Show this help message

HOOKS:
    INSTALL UNINSTALL UPGRADE RECOVERINSTALL RECOVERUPGRADE
    RECOVERUNINSTALL CLEAN UNDO

ENVIRONMENT:
    MLOPS_AGENT_SOCKET_PATH  Daemon socket (default: {})
    MLOPS_AGENT_PACKAGE_DB   Package descriptor directory (default: {})
    MLOPS_AGENT_LOG_LEVEL    Log filter (default: info)
    MLOPS_AGENT_LOG_FORMAT   json or pretty (default: json)

EXIT CODES:
    0  Success
    1  Failure
    2  Usage or configuration error
",
        env!("CARGO_PKG_VERSION"),
        agent_config::DEFAULT_SOCKET_PATH,
        agent_config::DEFAULT_PACKAGE_DB,
    );
}

async fn run_daemon(config: &EnvConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn RegistrationBackend> = Arc::new(MemoryBackend::new());
    let mut daemon = Daemon::new(Box::new(LocalBus::new()), backend);
    let enabled = daemon.start();
    if enabled == 0 {
        warn!("no module enabled, serving bus-level errors only");
    }
    let daemon = Arc::new(Mutex::new(daemon));

    let shutdown = ShutdownCoordinator::new();
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut server = tokio::spawn(run_server(
        config.server_config(),
        Arc::clone(&daemon),
        shutdown.clone(),
        stop_rx,
    ));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown signal received, draining");
        }
        // Only a bind or setup failure ends the server before a stop.
        finished = &mut server => {
            daemon.lock().stop();
            finished??;
            return Ok(());
        }
    }
    let _ = stop_tx.send(true);

    match shutdown.drain(config.shutdown_timeout).await {
        DrainResult::Complete => info!("all calls drained"),
        DrainResult::Timeout { remaining } => warn!(remaining, "drain timed out"),
    }
    daemon.lock().stop();

    server.await??;
    Ok(())
}

fn run_plugin(config: &EnvConfig, args: &[String]) -> ExitCode {
    let mut positional = Vec::new();
    let mut metadata = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--metadata" {
            let Some((key, value)) = iter.next().and_then(|kv| kv.split_once('=')) else {
                eprintln!("--metadata expects KEY=VALUE");
                return ExitCode::from(EXIT_USAGE);
            };
            metadata.push(Metadata::new(key, value));
        } else {
            positional.push(arg.as_str());
        }
    }

    let (hook, pkg_id, app_id) = match positional.as_slice() {
        [hook, pkg_id] => (*hook, *pkg_id, None),
        [hook, pkg_id, app_id] => (*hook, *pkg_id, Some(*app_id)),
        _ => {
            eprintln!("usage: mlops-agent plugin <HOOK> <PKGID> [APPID]");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    let hook: PluginHook = match hook.parse() {
        Ok(hook) => hook,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let packages = TomlPackageDb::new(&config.package_db);
    let backend = SocketBackend::new(&config.socket_path, config.max_frame_size);
    let installer = RpkInstaller::new(&packages, &backend);
    let args = HookArgs {
        pkg_id,
        app_id,
        metadata: &metadata,
    };
    match hook.run(&installer, &args) {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn run_parse(config: &EnvConfig, args: &[String]) -> ExitCode {
    let (manifest, app_info) = match args {
        [manifest] => (PathBuf::from(manifest), String::from("{}")),
        [manifest, flag, app_info] if flag == "--app-info" => {
            (PathBuf::from(manifest), app_info.clone())
        }
        _ => {
            eprintln!("usage: mlops-agent parse <MANIFEST> [--app-info JSON]");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let backend = SocketBackend::new(&config.socket_path, config.max_frame_size);
    match ManifestParser::new(&backend).parse(&manifest, &app_info) {
        Ok(report) => {
            println!(
                "registered {} model(s), {} pipeline(s), {} resource(s); {} skipped, {} failed",
                report.models, report.pipelines, report.resources, report.skipped, report.failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(manifest = %manifest.display(), error = %e, "manifest rejected");
            ExitCode::FAILURE
        }
    }
}
