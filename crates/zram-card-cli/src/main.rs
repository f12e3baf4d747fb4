//! zram-card CLI - zram statistics, swap device management, and the
//! dashboard server.

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zram_card_core::settings::DEFAULT_SETTINGS_PATH;

/// zram-card: compressed swap statistics and management
#[derive(Parser)]
#[command(name = "zram-card")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    /// Timeout for each zram/swap tool invocation, in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show device statistics and the compression summary
    Status,

    /// Create a zram device and enable it as swap
    Create(commands::CreateArgs),

    /// Remove one zram swap device, or all of them
    Remove(commands::RemoveArgs),

    /// Serve the dashboard endpoints
    Serve(commands::ServeArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::new(cli.config, cli.timeout, cli.format);

    let result = match cli.command {
        Commands::Status => commands::status(&ctx),
        Commands::Create(args) => commands::create(&ctx, &args),
        Commands::Remove(args) => commands::remove(&ctx, &args),
        Commands::Serve(args) => commands::serve(ctx, &args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
