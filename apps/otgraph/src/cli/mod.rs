//! # otgraph CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `correlate` - Resolve an observation file into devices
//! - `snapshot` - Write a topology snapshot (JSON or binary)
//! - `inspect` - Decode and summarize a binary snapshot
//! - `path` - Shortest hop path between two devices
//! - `stats` - Topology statistics
//! - `config` - Print the effective configuration

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use otgraph_core::OtGraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// otgraph - ICS topology discovery
///
/// Resolves per-source observations into devices and maintains the
/// device/connection topology they form.
#[derive(Parser, Debug)]
#[command(name = "otgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./otgraph.toml if present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Correlate an observation file and print the resolved devices
    Correlate {
        /// JSON file: array of observations or {"observations": [...]}
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Build the topology and write a snapshot
    Snapshot {
        /// Observation file
        #[arg(short, long)]
        file: PathBuf,

        /// Connection file (JSON array)
        #[arg(short, long)]
        connections: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (json, binary)
        #[arg(short = 't', long, default_value = "json")]
        format: String,
    },

    /// Decode a binary snapshot and print a summary
    Inspect {
        /// Binary snapshot file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Shortest hop path between two devices
    Path {
        /// Observation file
        #[arg(short, long)]
        file: PathBuf,

        /// Connection file (JSON array)
        #[arg(short, long)]
        connections: PathBuf,

        /// Source device: id, MAC, IP or hostname
        #[arg(long)]
        from: String,

        /// Target device: id, MAC, IP or hostname
        #[arg(long)]
        to: String,
    },

    /// Topology statistics
    Stats {
        /// Observation file
        #[arg(short, long)]
        file: PathBuf,

        /// Connection file (JSON array)
        #[arg(short, long)]
        connections: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), OtGraphError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config, host, port).await,
        Some(Commands::Correlate { file }) => cmd_correlate(&config, json_mode, &file),
        Some(Commands::Snapshot {
            file,
            connections,
            output,
            format,
        }) => cmd_snapshot(&config, &file, connections.as_deref(), &output, &format),
        Some(Commands::Inspect { input }) => cmd_inspect(json_mode, &input),
        Some(Commands::Path {
            file,
            connections,
            from,
            to,
        }) => cmd_path(&config, json_mode, &file, &connections, &from, &to),
        Some(Commands::Stats { file, connections }) => {
            cmd_stats(&config, json_mode, &file, connections.as_deref())
        }
        Some(Commands::Config) | None => cmd_config(&config),
    }
}
