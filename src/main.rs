// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use docscan::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "docscan")]
#[command(about = "Find the largest document outline in an image")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (default: ~/.config/docscan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the largest rectangle in an image using recorded engine output
    Detect {
        /// Image file to analyze
        image: PathBuf,

        /// Engine script (JSON) with the candidates to replay
        #[arg(short, long)]
        candidates: PathBuf,

        /// Orientation override (e.g. "rotate-90" or an EXIF value 1-8)
        #[arg(short, long)]
        orientation: Option<String>,

        /// Ignore the orientation stored in the image's EXIF data
        #[arg(long)]
        ignore_exif: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=docscan=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect {
            image,
            candidates,
            orientation,
            ignore_exif,
        } => cli::detect(&config, &image, &candidates, orientation.as_deref(), ignore_exif)?,
        Commands::Config => cli::print_config(&config, cli.config.as_deref())?,
    }

    Ok(())
}
