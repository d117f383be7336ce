//! # SlopeQuest Application Library
//!
//! The server, CLI, configuration and file-backed remote store behind the
//! `slopequest` binary. Every game rule lives in `slopequest-core`.

pub mod api;
pub mod cli;
pub mod config;
pub mod remote_fs;
