// SPDX-License-Identifier: GPL-3.0-only

use asset_capture::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "asset-capture")]
#[command(about = "Capture photo and video evidence and sync it when back online")]
#[command(version = env!("BUILD_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/asset-capture/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a photo
    Photo {
        /// Output directory (default: ~/Pictures/asset-capture)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat connectivity as offline (the upload is queued)
        #[arg(long)]
        offline: bool,
    },

    /// Record a video
    Video {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "3")]
        duration: u64,

        /// Output directory (default: ~/Pictures/asset-capture)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat connectivity as offline (the upload is queued)
        #[arg(long)]
        offline: bool,
    },

    /// Capture photos offline, go online and print the synced uploads
    SyncDemo {
        /// Number of photos to capture while offline
        #[arg(short, long, default_value = "3")]
        items: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=asset_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Commands::Photo { output, offline } => cli::take_photo(config, output, offline).await,
            Commands::Video {
                duration,
                output,
                offline,
            } => cli::record_video(config, duration, output, offline).await,
            Commands::SyncDemo { items } => cli::sync_demo(config, items).await,
        }
    })
}
