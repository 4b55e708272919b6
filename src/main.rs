use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dock2tauri::config::{self, LaunchRequest, PackageMode};
use dock2tauri::docker::{CancelToken, DockerCli};
use dock2tauri::packager::TauriCli;
use dock2tauri::readiness::{HttpProbe, Poller};
use dock2tauri::{Controller, exit_code};

/// Run any Docker image as a native desktop app through Tauri.
#[derive(Debug, Parser)]
#[command(name = "dock2tauri", version)]
struct Cli {
    /// Docker image to run [default: nginx:alpine]
    #[arg(short, long)]
    image: Option<String>,

    /// Host port to bind to [default: 8088]
    #[arg(short = 'p', long)]
    host_port: Option<u16>,

    /// Container port to expose [default: 80]
    #[arg(short = 'c', long)]
    container_port: Option<u16>,

    /// Build release bundles instead of starting a dev session
    #[arg(long)]
    build: bool,

    /// Target triple for the release build
    #[arg(long, value_name = "TRIPLE")]
    target: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Project containing the packaging project [default: current directory]
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "dock2tauri=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let cfg = config::load(&project_dir)?;

    let mode = if cli.build {
        PackageMode::Release { target: cli.target }
    } else {
        if cli.target.is_some() {
            warn!("--target only applies with --build; ignoring it");
        }
        PackageMode::Dev
    };

    let request = LaunchRequest::new(
        cli.image.unwrap_or(cfg.image),
        cli.host_port.unwrap_or(cfg.host_port),
        cli.container_port.unwrap_or(cfg.container_port),
        mode,
    )?;

    let cancel = CancelToken::new();
    register_signals(&cancel)?;

    let packager = TauriCli::from_command_line(&cfg.packager_command)?;
    let poller = Poller {
        attempts: cfg.readiness_attempts,
        ..Poller::default()
    };

    info!(
        image = request.image(),
        mode = request.mode().as_str(),
        "dock2tauri: Docker to desktop bridge"
    );

    let mut controller = Controller::new(
        request,
        project_dir.join(&cfg.tauri_dir),
        Box::new(DockerCli::default()),
        Box::new(packager),
        Box::new(HttpProbe::new()?),
        cancel,
    )
    .with_poller(poller);

    let result = controller.run();
    Ok(ExitCode::from(exit_code(&result)))
}

/// Route SIGINT/SIGTERM into `cancel`. A second signal exits immediately.
fn register_signals(cancel: &CancelToken) -> Result<()> {
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(sig, 130, cancel.flag())
            .context("failed to install signal handler")?;
        signal_hook::flag::register(sig, cancel.flag())
            .context("failed to install signal handler")?;
    }
    Ok(())
}
