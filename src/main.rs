// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photo_booth::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photo-booth")]
#[command(about = "Guided photo booth: countdown capture and background removal")]
#[command(version = photo_booth::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Image served as the camera feed
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the wizard in the terminal (default)
    Terminal,

    /// Run the whole wizard without a UI and save the results
    Capture {
        /// Output directory (default: ~/Pictures/photo-booth)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Countdown start value in seconds (0 captures immediately)
        #[arg(short, long)]
        countdown: Option<u32>,

        /// Background colour tolerance
        #[arg(short, long)]
        tolerance: Option<f32>,

        /// Open the cutout when done
        #[arg(long)]
        open: bool,
    },

    /// Print the effective configuration and where it lives
    Config {
        /// Write the effective configuration back to disk
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photo_booth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match cli.command {
        None | Some(Commands::Terminal) => cli::run_terminal(config, cli.input),
        Some(Commands::Capture {
            output,
            countdown,
            tolerance,
            open,
        }) => cli::capture(
            config,
            cli::CaptureArgs {
                input: cli.input.ok_or("capture needs a camera feed; pass --input <image>")?,
                output,
                countdown,
                tolerance,
                open,
            },
        ),
        Some(Commands::Config { save }) => cli::show_config(&config, cli.config.as_deref(), save),
    }
}
