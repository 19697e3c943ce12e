//! Argon daemon
//!
//! Capture-session broker for sandboxed desktop applications.
//!
//! # Usage
//!
//! ```bash
//! # Serve the portal socket
//! argon-portald run
//!
//! # Inspect a running daemon
//! argon-portald status
//! argon-portald sessions
//!
//! # Stop the daemon
//! argon-portald stop
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Argon - capture-session broker for sandboxed desktop applications
#[derive(Parser)]
#[command(name = "argon-portald")]
#[command(version)]
#[command(about = "Capture-session broker for sandboxed desktop applications", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the portal socket
    Run(commands::RunArgs),

    /// Show status of the running daemon
    Status,

    /// List live sessions
    Sessions,

    /// Stop the running daemon
    Stop,

    /// Manage configuration files
    Config(commands::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("argon_core={}", level).parse().unwrap())
                .add_directive(format!("argon_portald={}", level).parse().unwrap()),
        )
        .with_target(false)
        .init();

    // Run the appropriate command
    match cli.command {
        Commands::Run(args) => commands::run(args).await?,
        Commands::Status => commands::status().await?,
        Commands::Sessions => commands::sessions().await?,
        Commands::Stop => commands::stop().await?,
        Commands::Config(args) => commands::config(args).await?,
    }

    Ok(())
}
