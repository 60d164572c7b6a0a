// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coherro - prompt-to-video generation server.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod inspect;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Coherro - turn prompts into animation videos.
#[derive(Parser, Debug)]
#[command(name = "coherro", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP/WebSocket server.
    Serve,
    /// Parse a model response file and print the result as JSON.
    Parse {
        /// File holding the raw model response.
        file: PathBuf,
        /// Sanitize the extracted code and explanation.
        #[arg(long)]
        sanitize: bool,
    },
    /// Render a scene script locally, falling back to the placeholder.
    Render {
        /// Scene script to render.
        script: PathBuf,
        /// Where to write the video.
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Parsing needs no configuration.
    if let Some(Commands::Parse { file, sanitize }) = &cli.command {
        if let Err(e) = inspect::run_parse(file, *sanitize) {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let loaded = match &cli.config {
        Some(path) => coherro_config::load_and_validate_path(path),
        None => coherro_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            coherro_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Render { script, out }) => inspect::run_render(&config, &script, &out).await,
        Some(Commands::Parse { .. }) => Ok(()),
        None => {
            println!("coherro: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
