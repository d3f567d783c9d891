//! # otgraph - ICS Topology Discovery Server
//!
//! The main binary for the otgraph discovery engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) for the telemetry parsers
//! - CLI interface for offline batches
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     apps/otgraph (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐     │
//! │  │   CLI       │    │   HTTP API  │    │  Config (TOML +  │     │
//! │  │  (clap)     │    │   (axum)    │    │  environment)    │     │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘     │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                    ┌───────────────┐                            │
//! │                    │ otgraph-core  │                            │
//! │                    │ (THE LOGIC)   │                            │
//! │                    └───────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! otgraph server --host 0.0.0.0 --port 8080
//!
//! # Offline operations
//! otgraph correlate -f observations.json
//! otgraph snapshot -f observations.json -c connections.json -o site.otgs -t binary
//! otgraph path -f observations.json -c connections.json --from <id> --to <id>
//! ```

use clap::Parser;
use otgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // OTGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("OTGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "otgraph=info,otgraph_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
   ___  _____ ____                 _
  / _ \|_   _/ ___|_ __ __ _ _ __ | |__
 | | | | | || |  _| '__/ _` | '_ \| '_ \
 | |_| | | || |_| | | | (_| | |_) | | | |
  \___/  |_| \____|_|  \__,_| .__/|_| |_|
                            |_|
  ICS Topology Discovery v{}

  Deterministic • Correlated • Purdue-aware
"#,
        env!("CARGO_PKG_VERSION")
    );
}
