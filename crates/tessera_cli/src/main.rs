//! Tessera CLI
//!
//! Runs the Tessera backend and inspects project files.
//!
//! # Commands
//!
//! - `serve` - Run the backend over stdin/stdout
//! - `inspect` - Display project statistics
//! - `history` - List a project's transaction log
//! - `backup` - Write a timestamped copy of a project

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tessera backend and project tools.
#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backend, reading requests from stdin and writing replies to stdout
    Serve {
        /// Directory holding the application settings
        #[arg(long)]
        app_data: PathBuf,
    },

    /// Display project statistics
    Inspect {
        /// Path to the project file
        project: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the transaction log stored in a project
    History {
        /// Path to the project file
        project: PathBuf,

        /// Show only the most recent transactions
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a timestamped backup next to a project
    Backup {
        /// Path to the project file
        project: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Stdout carries protocol frames in serve mode, so logs go to stderr.
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { app_data } => {
            commands::serve::run(app_data).await?;
        }
        Commands::Inspect { project, format } => {
            commands::inspect::run(&project, &format).await?;
        }
        Commands::History {
            project,
            limit,
            format,
        } => {
            commands::history::run(&project, limit, &format).await?;
        }
        Commands::Backup { project } => {
            commands::backup::run(&project).await?;
        }
        Commands::Version => {
            println!("Tessera CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Tessera Core v{}", tessera_core::VERSION);
        }
    }

    Ok(())
}
