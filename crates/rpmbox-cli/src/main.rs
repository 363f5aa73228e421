mod commands;

use clap::{Parser, Subcommand};
use commands::{exit_code_for, EXIT_ENGINE_MISSING, EXIT_FAILURE, EXIT_SOCKET};
use rpmbox_config::{parse_config_file, SandboxConfig};
use rpmbox_core::Reconciler;
use rpmbox_engine::{ensure_socket_active, podman_installed, PodmanEngine, SocketScope};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "rpmbox",
    version,
    about = "Podman-driven reproducible RPM build sandbox"
)]
struct Cli {
    /// Path to the sandbox config file.
    #[arg(long, default_value = "rpmbox.toml")]
    config: PathBuf,

    /// One-shot mode: run the configured build command to completion in a
    /// fresh container instead of leaving an interactive one running.
    #[arg(long, default_value_t = false, global = true)]
    auto: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Remove the image and container if they exist, then build the image
    /// and run the container again.
    Rebuild,
    /// Remove the container if it exists, then run it again.
    Rerun,
    /// Stop the container if it is running, then bring it up again.
    Restart,
    /// Remove the image, and the container if it exists.
    RmImage,
    /// Remove the container if it exists.
    RmContainer,
    /// Stop the container if it is running.
    Stop,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RPMBOX_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = if cli.config.exists() {
        match parse_config_file(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(EXIT_FAILURE);
            }
        }
    } else {
        debug!(
            "config file {} not found, using defaults",
            cli.config.display()
        );
        SandboxConfig::default()
    };

    if !podman_installed() {
        eprintln!(
            "error: podman is not installed (install: {})",
            rpmbox_engine::PODMAN_INSTALL_HINT
        );
        return ExitCode::from(EXIT_ENGINE_MISSING);
    }

    let scope = SocketScope::detect();
    if let Err(e) = ensure_socket_active(scope) {
        eprintln!("error: {e}");
        return ExitCode::from(EXIT_SOCKET);
    }

    let engine = PodmanEngine::new(scope);
    let reconciler = Reconciler::new(&engine, &config);

    let result = match cli.action {
        None => commands::up::run(&reconciler, &config, cli.auto),
        Some(Action::Rebuild) => commands::rebuild::run(&reconciler, &config, cli.auto),
        Some(Action::Rerun) => commands::rerun::run(&reconciler, &config, cli.auto),
        Some(Action::Restart) => commands::restart::run(&reconciler, &config, cli.auto),
        Some(Action::RmImage) => commands::rm_image::run(&reconciler),
        Some(Action::RmContainer) => commands::rm_container::run(&reconciler),
        Some(Action::Stop) => commands::stop::run(&reconciler),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}
