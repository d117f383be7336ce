//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command opens the session, runs, and lets the session end (which
//! flushes pending remote writes) before returning.

use crate::api::{self, ProfileResponse};
use crate::config::AppConfig;
use crate::remote_fs::FileRemoteStore;
use serde::Serialize;
use slopequest_core::{
    AnswerOutcome, GameSession, GridPoint, OfflineRemoteStore, QuestionPhase, QuizError,
    RedbStore, RemoteProfileStore, ShopOutcome, TracingSink, format_slope,
};
use std::io::{BufRead, Write};
use std::sync::Arc;

// =============================================================================
// SESSION SETUP
// =============================================================================

/// Open the local database and remote store, then start a session.
pub fn open_session(config: &AppConfig) -> Result<GameSession, QuizError> {
    std::fs::create_dir_all(&config.data_dir).map_err(|e| {
        QuizError::IoError(format!(
            "Cannot create data directory '{}': {}",
            config.data_dir.display(),
            e
        ))
    })?;
    let local = RedbStore::open(config.database_path())?;

    let remote: Arc<dyn RemoteProfileStore> = if config.remote.enabled {
        Arc::new(FileRemoteStore::new(
            &config.remote.dir,
            &config.remote.account,
        )?)
    } else {
        Arc::new(OfflineRemoteStore)
    };

    GameSession::start(
        Box::new(local),
        remote,
        Arc::new(TracingSink),
        config.game.clone(),
    )
}

fn print_json(value: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// Print the profile as JSON or as a short table.
pub fn print_profile(session: &GameSession, json_mode: bool) {
    let profile = ProfileResponse::from_session(session);
    if json_mode {
        print_json(&profile);
        return;
    }

    let name = if profile.player_id.is_empty() {
        "(unnamed)"
    } else {
        profile.player_id.as_str()
    };
    println!("SlopeQuest Profile");
    println!("==================");
    println!("Player:   {}", name);
    println!(
        "Level:    {} (question {}/{})",
        profile.level,
        profile.question + 1,
        profile.questions_per_level
    );
    println!("Score:    {}", profile.score);
    println!("Coins:    {}", profile.coins);
    println!(
        "Answers:  {} correct, {} wrong",
        profile.correct_answers, profile.wrong_answers
    );
    println!(
        "Items:    {:?} (equipped {})",
        profile.purchased_items, profile.selected_item
    );
    println!(
        "Colored:  {}",
        if profile.colored_variant_purchased {
            "yes"
        } else {
            "no"
        }
    );
    println!(
        "Settings: haptic {:.2}, audio {:.2}",
        profile.haptic_intensity, profile.audio_volume
    );
    println!(
        "Sync:     {}",
        if profile.online { "online" } else { "local only" }
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), QuizError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    // Fully initialized before the listener binds.
    let session = open_session(&config)?;

    println!("SlopeQuest Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Database: {}", config.database_path().display());
    println!(
        "  Remote:   {}",
        if session.is_online() {
            config.remote.dir.display().to_string()
        } else {
            "disabled".to_string()
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /profile      - Profile and question state");
    println!("  POST /player       - Name the player");
    println!("  POST /points       - Select two points");
    println!("  POST /answer       - Submit a slope");
    println!("  POST /shop/buy     - Buy or equip an item");
    println!("  POST /shop/select  - Equip an owned item");
    println!("  POST /shop/colored - Unlock colored points");
    println!("  POST /settings     - Update settings");
    println!("  POST /new-game     - Start over");
    println!("  POST /continue     - Resume saved game");
    println!("  GET  /health       - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(session, &config.server).await
}

// =============================================================================
// PROFILE COMMANDS
// =============================================================================

/// Show the saved profile.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), QuizError> {
    let session = open_session(config)?;
    print_profile(&session, json_mode);
    Ok(())
}

/// Set the player name.
pub fn cmd_name(config: &AppConfig, json_mode: bool, name: &str) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    session.name_player(name)?;
    if !json_mode {
        println!("Welcome, {}!", session.state().player_id());
    }
    print_profile(&session, json_mode);
    Ok(())
}

/// Buy or equip a shop item.
pub fn cmd_shop(config: &AppConfig, json_mode: bool, item: u32) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    let outcome = session.buy_or_select(item)?;
    if json_mode {
        print_json(&outcome);
    } else {
        println!("{}", describe_shop(&outcome));
    }
    Ok(())
}

/// Equip an owned item.
pub fn cmd_select(config: &AppConfig, json_mode: bool, item: u32) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    session.select_item(item)?;
    if json_mode {
        print_json(&ShopOutcome::Selected { item });
    } else {
        println!("Equipped item {}.", item);
    }
    Ok(())
}

/// Update settings.
pub fn cmd_settings(
    config: &AppConfig,
    json_mode: bool,
    haptic: Option<f32>,
    audio: Option<f32>,
) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    if let Some(value) = haptic {
        session.set_haptic_intensity(value);
    }
    if let Some(value) = audio {
        session.set_audio_volume(value);
    }
    print_profile(&session, json_mode);
    Ok(())
}

/// Start over.
pub fn cmd_new_game(config: &AppConfig, json_mode: bool) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    session.new_game();
    if !json_mode && session.take_fresh_start() {
        println!("New game started. Good luck!");
    }
    print_profile(&session, json_mode);
    Ok(())
}

/// Resume the saved game and re-sync with the remote store.
pub fn cmd_continue(config: &AppConfig, json_mode: bool) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    match session.continue_game() {
        Ok(report) => {
            tracing::info!(
                remote_found = report.remote_found,
                applied = ?report.applied,
                "saved game resumed"
            );
        }
        Err(QuizError::PlayerNotNamed) => return Err(QuizError::PlayerNotNamed),
        Err(e) => tracing::warn!(error = %e, "resumed from local data only"),
    }
    print_profile(&session, json_mode);
    Ok(())
}

// =============================================================================
// PLAY COMMAND
// =============================================================================

/// One line of input in the terminal play loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayCommand {
    Points(GridPoint, GridPoint),
    Point(GridPoint),
    Clear,
    Answer(String),
    Shop(u32),
    Select(u32),
    Colored,
    Status,
    Help,
    Quit,
}

/// Parse a play-loop line.
pub fn parse_play_command(line: &str) -> Result<PlayCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("Type a command, or 'help'.".to_string());
    };
    let rest: Vec<&str> = words.collect();

    let int = |s: &str| {
        s.parse::<i32>()
            .map_err(|_| format!("'{}' is not a whole number", s))
    };
    let index = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| format!("'{}' is not an item number", s))
    };

    match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("points", [x1, y1, x2, y2]) => Ok(PlayCommand::Points(
            GridPoint::new(int(x1)?, int(y1)?),
            GridPoint::new(int(x2)?, int(y2)?),
        )),
        ("point", [x, y]) => Ok(PlayCommand::Point(GridPoint::new(int(x)?, int(y)?))),
        ("clear", []) => Ok(PlayCommand::Clear),
        ("answer", [value]) => Ok(PlayCommand::Answer((*value).to_string())),
        ("shop", [item]) => Ok(PlayCommand::Shop(index(item)?)),
        ("select", [item]) => Ok(PlayCommand::Select(index(item)?)),
        ("colored", []) => Ok(PlayCommand::Colored),
        ("status", []) => Ok(PlayCommand::Status),
        ("help", []) => Ok(PlayCommand::Help),
        ("quit" | "exit", []) => Ok(PlayCommand::Quit),
        _ => Err(format!("Unknown command '{}'. Type 'help'.", line.trim())),
    }
}

const PLAY_HELP: &str = "\
Commands:
  points X1 Y1 X2 Y2   pick both points
  point X Y            pick one point
  clear                pick again
  answer VALUE         submit the slope
  shop N / select N    buy or equip item N
  colored              unlock colored points
  status               show your progress
  quit                 save and leave";

/// Play in the terminal until `quit` or end of input.
pub fn cmd_play(config: &AppConfig, json_mode: bool) -> Result<(), QuizError> {
    let mut session = open_session(config)?;
    if !session.state().is_named() {
        println!("Tip: run `slopequest name <NAME>` to save your progress under your name.");
    }
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    play_loop(&mut session, stdin.lock(), &mut stdout, json_mode)?;
    session.end();
    Ok(())
}

/// Drive `session` with commands read from `input`.
pub fn play_loop(
    session: &mut GameSession,
    input: impl BufRead,
    out: &mut impl Write,
    json_mode: bool,
) -> Result<(), QuizError> {
    let io_err = |e: std::io::Error| QuizError::IoError(e.to_string());

    if !json_mode {
        writeln!(out, "{}", question_prompt(session)).map_err(io_err)?;
    }

    for line in input.lines() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_play_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "{}", msg).map_err(io_err)?;
                continue;
            }
        };

        let reply = match command {
            PlayCommand::Quit => break,
            PlayCommand::Help => PLAY_HELP.to_string(),
            PlayCommand::Status => {
                let profile = ProfileResponse::from_session(session);
                if json_mode {
                    serde_json::to_string(&profile).unwrap_or_default()
                } else {
                    format!(
                        "Level {} question {}: score {}, coins {}",
                        profile.level,
                        profile.question + 1,
                        profile.score,
                        profile.coins
                    )
                }
            }
            PlayCommand::Points(a, b) => match session.select_points(a, b) {
                Ok(()) => format!("Points {} and {}. What is the slope?", a, b),
                Err(e) => e.to_string(),
            },
            PlayCommand::Point(p) => match session.place_point(p) {
                Ok(QuestionPhase::AwaitingAnswer) => {
                    format!("Second point {}. What is the slope?", p)
                }
                Ok(_) => format!("First point {}.", p),
                Err(e) => e.to_string(),
            },
            PlayCommand::Clear => {
                session.clear_points();
                "Points cleared.".to_string()
            }
            PlayCommand::Answer(raw) => match session.submit_answer(&raw) {
                Ok(outcome) => {
                    let notice = session.take_level_notice();
                    if json_mode {
                        serde_json::to_string(&outcome).unwrap_or_default()
                    } else {
                        describe_answer(session, &outcome, notice)
                    }
                }
                Err(e) => e.to_string(),
            },
            PlayCommand::Shop(item) => match session.buy_or_select(item) {
                Ok(outcome) => describe_shop(&outcome),
                Err(e) => e.to_string(),
            },
            PlayCommand::Select(item) => match session.select_item(item) {
                Ok(()) => format!("Equipped item {}.", item),
                Err(e) => e.to_string(),
            },
            PlayCommand::Colored => describe_shop(&session.purchase_colored_variant()),
        };
        writeln!(out, "{}", reply).map_err(io_err)?;
    }

    Ok(())
}

fn question_prompt(session: &GameSession) -> String {
    let state = session.state();
    let hint = if state.current_level() <= 1 {
        "whole numbers"
    } else {
        "two decimals"
    };
    format!(
        "Level {}, question {}/{} ({}). Pick two points.",
        state.current_level(),
        state.current_question() + 1,
        session.config().questions_per_level,
        hint
    )
}

fn describe_answer(session: &GameSession, outcome: &AnswerOutcome, notice: bool) -> String {
    let mut text = match outcome {
        AnswerOutcome::Correct { reward, .. } => format!(
            "Correct! +{} (score {}, coins {})",
            reward,
            session.state().score(),
            session.state().coins()
        ),
        AnswerOutcome::Retry { attempts_remaining } => {
            return format!("Not quite. {} attempts left.", attempts_remaining);
        }
        AnswerOutcome::Revealed { canonical, .. } => {
            format!("Out of attempts. The slope was {}.", format_slope(*canonical))
        }
    };

    if let Some(level) = outcome.advance().and_then(|a| a.completed_level) {
        text.push_str(&format!("\nLevel {} complete!", level));
    }
    if notice {
        text.push_str("\nLevel 2 unlocked: answers now use two decimals, e.g. 1.33.");
    }
    text.push('\n');
    text.push_str(&question_prompt(session));
    text
}

fn describe_shop(outcome: &ShopOutcome) -> String {
    match outcome {
        ShopOutcome::Purchased { item, coins_left } => {
            format!("Bought and equipped item {} ({} coins left).", item, coins_left)
        }
        ShopOutcome::Selected { item } => format!("Equipped item {}.", item),
        ShopOutcome::ColoredUnlocked { coins_left } => {
            format!("Colored points unlocked ({} coins left).", coins_left)
        }
        ShopOutcome::AlreadyOwned => "Already unlocked.".to_string(),
        ShopOutcome::InsufficientFunds { needed, available } => format!(
            "Not enough coins: need {}, you have {}.",
            needed, available
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
