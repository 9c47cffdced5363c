//! Ruins client binary.
//!
//! ```bash
//! RUINS_PROFILE=development cargo run -p ruins-client -- play
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use ruins_client::{App, AppConfig, FrameCounters, logging, profiling};

#[derive(Parser)]
#[command(name = "ruins")]
#[command(about = "Turn-based tile dungeon crawler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a game
    Play,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let _guard = logging::setup_logging(&config)?;

    match cli.command {
        Command::Play => play(config).await,
    }
}

async fn play(config: AppConfig) -> Result<()> {
    tracing::info!(
        width = config.window.width,
        height = config.window.height,
        fullscreen = config.window.fullscreen,
        fps = config.target_fps,
        animation = !config.disable_animation,
        "starting"
    );

    let counters = FrameCounters::new();
    if config.profiling.enabled {
        if let Err(err) = profiling::spawn(config.profiling.port, counters.clone()) {
            tracing::warn!("{err:#}. Continuing without profiling endpoint.");
        }
    }

    let summary = App::new(config, counters)?.run().await?;
    println!(
        "{:?} after {} frames on floor {}",
        summary.outcome,
        summary.frames,
        summary.depth + 1
    );
    Ok(())
}
