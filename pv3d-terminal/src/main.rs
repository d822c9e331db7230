/// PV3D Terminal Viewer - Interactive product showcase
///
/// Renders the product viewer with half-block pixels in the terminal.
/// Controls:
///   - Mouse drag / WASD / Arrow Keys: Orbit the camera
///   - Scroll / +/-: Zoom
///   - Click product: Toggle fast spin
///   - Space/T or the button: Toggle auto-rotation
///   - R: Reset view
///   - Q/ESC: Quit
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use pv3d_core::{EnvironmentPreset, ProductViewer, ViewerConfig};
use pv3d_terminal::{TerminalApp, TerminalOptions};

#[derive(Debug, Parser)]
#[command(name = "pv3d-terminal", version, about = "Interactive 3D product viewer for the terminal")]
struct Args {
    /// TOML file overriding the viewer defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frame rate
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,

    /// Lighting environment preset (city, studio, sunset, night, warehouse)
    #[arg(long)]
    environment: Option<EnvironmentPreset>,

    /// Skip the contact shadow under the product
    #[arg(long)]
    no_shadows: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp_millis();
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(environment) = args.environment {
        config.environment = environment;
    }
    if args.no_shadows {
        config.shadows.enabled = false;
    }
    config.validate().context("invalid viewer configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    log::info!("Starting PV3D terminal viewer v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    let viewer = ProductViewer::new(config).context("failed to create the viewer")?;

    let mut app = TerminalApp::new(viewer, TerminalOptions { fps: args.fps })
        .context("failed to set up the terminal")?;
    app.run().context("terminal viewer failed")?;

    Ok(())
}
