//! # SlopeQuest - Slope Quiz Server
//!
//! The main binary for the SlopeQuest learning game.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) for a game client
//! - CLI interface with a terminal play loop
//! - File-backed remote profile store
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   apps/slopequest (THE BINARY)                  │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐     │
//! │  │   CLI       │    │   HTTP API  │    │  Remote store    │     │
//! │  │  (clap)     │    │   (axum)    │    │  (JSON files)    │     │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘     │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                   ┌─────────────────┐                           │
//! │                   │ slopequest-core │                           │
//! │                   │   (THE LOGIC)   │                           │
//! │                   └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! slopequest serve --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! slopequest name Ada
//! slopequest play
//! slopequest shop 2
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SLOPEQUEST_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("SLOPEQUEST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "slopequest=info,slopequest_core=info,tower_http=debug".into()
    });

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
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = slopequest::cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = slopequest::cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the SlopeQuest startup banner.
fn print_banner() {
    println!(
        r#"
   ____  _                  ___                  _
  / ___|| | ___  _ __   ___/ _ \ _   _  ___  ___| |_
  \___ \| |/ _ \| '_ \ / _ \ | | | | | |/ _ \/ __| __|
   ___) | | (_) | |_) |  __/ |_| | |_| |  __/\__ \ |_
  |____/|_|\___/| .__/ \___|\__\_\\__,_|\___||___/\__|
                |_|

  Slope Quiz v{}

  Pick two points • Find the slope • Level up
"#,
        env!("CARGO_PKG_VERSION")
    );
}
