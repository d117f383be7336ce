//! # SlopeQuest CLI Module
//!
//! This module implements the CLI interface for SlopeQuest.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `status` - Show the saved profile
//! - `name` - Set the player name (once)
//! - `play` - Play in the terminal
//! - `shop` - Buy an item, or equip it if owned
//! - `select` - Equip an owned item
//! - `settings` - Change haptic intensity / audio volume
//! - `new-game` - Start over, keeping the name
//! - `continue` - Reload and re-sync the saved game

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use slopequest_core::QuizError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// SlopeQuest - learn slopes by picking points on a grid
#[derive(Parser, Debug)]
#[command(name = "slopequest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the local profile database
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory of the file-backed remote profile store
    #[arg(long, global = true)]
    pub remote_dir: Option<PathBuf>,

    /// Remote account to sign in as
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Run without the remote profile store
    #[arg(long, global = true)]
    pub offline: bool,

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
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the saved profile
    Status,

    /// Set the player name (allowed once)
    Name {
        /// Player name, 1-32 characters
        name: String,
    },

    /// Play in the terminal
    Play,

    /// Buy a shop item, or equip it if already owned
    Shop {
        /// Item index
        item: u32,
    },

    /// Equip an owned shop item
    Select {
        /// Item index
        item: u32,
    },

    /// Change device settings
    Settings {
        /// Haptic intensity in [0, 1]
        #[arg(long)]
        haptic: Option<f32>,

        /// Audio volume in [0, 1]
        #[arg(long)]
        audio: Option<f32>,
    },

    /// Start a new game (keeps the player name and settings)
    NewGame,

    /// Continue the saved game
    Continue,
}

impl Cli {
    /// Resolve the configuration: file and environment, then flags.
    pub fn app_config(&self) -> Result<AppConfig, QuizError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.remote_dir {
            config.remote.dir = dir.clone();
        }
        if let Some(account) = &self.account {
            config.remote.account = account.clone();
        }
        if self.offline {
            config.remote.enabled = false;
        }
        Ok(config)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), QuizError> {
    let config = cli.app_config()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(config, host, port).await,
        Some(Commands::Name { name }) => cmd_name(&config, json_mode, &name),
        Some(Commands::Play) => cmd_play(&config, json_mode),
        Some(Commands::Shop { item }) => cmd_shop(&config, json_mode, item),
        Some(Commands::Select { item }) => cmd_select(&config, json_mode, item),
        Some(Commands::Settings { haptic, audio }) => {
            cmd_settings(&config, json_mode, haptic, audio)
        }
        Some(Commands::NewGame) => cmd_new_game(&config, json_mode),
        Some(Commands::Continue) => cmd_continue(&config, json_mode),
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
