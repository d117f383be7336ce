//! # Application Configuration
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. TOML file passed with `--config`
//! 3. `SLOPEQUEST_*` environment variables
//! 4. CLI flags (applied by the `cli` module)
//!
//! ## Example
//!
//! ```toml
//! data_dir = "/var/lib/slopequest"
//!
//! [remote]
//! dir = "/var/lib/slopequest/cloud"
//! account = "classroom-7"
//!
//! [server]
//! port = 9090
//! rate_limit = 20
//!
//! [game]
//! questions_per_level = 5
//! ```

use serde::{Deserialize, Serialize};
use slopequest_core::{GameConfig, QuizError};
use std::path::{Path, PathBuf};

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// CONFIG STRUCTURE
// =============================================================================

/// Full configuration of the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the local profile database.
    pub data_dir: PathBuf,
    pub remote: RemoteConfig,
    pub server: ServerConfig,
    pub game: GameConfig,
}

/// File-backed remote profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// `false` runs local-only.
    pub enabled: bool,
    /// Directory with one JSON document per account.
    pub dir: PathBuf,
    /// Account this device signs in as.
    pub account: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer key required on every route except `/health`.
    pub api_key: Option<String>,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: u32,
    /// Comma-separated origins, or `*`. Unset means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("slopequest-data"),
            remote: RemoteConfig::default(),
            server: ServerConfig::default(),
            game: GameConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("slopequest-data").join("remote"),
            account: "local-player".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_key: None,
            rate_limit: 100,
            cors_origins: None,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, QuizError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.game.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, QuizError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            QuizError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(QuizError::InvalidConfig(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            QuizError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, QuizError> {
        toml::from_str(text).map_err(|e| QuizError::InvalidConfig(e.to_string()))
    }

    /// Apply `SLOPEQUEST_*` overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), QuizError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = var("SLOPEQUEST_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("SLOPEQUEST_REMOTE_DIR") {
            self.remote.dir = PathBuf::from(dir);
        }
        if let Some(account) = var("SLOPEQUEST_ACCOUNT") {
            self.remote.account = account;
        }
        if let Some(raw) = var("SLOPEQUEST_QUESTIONS_PER_LEVEL") {
            self.game.questions_per_level = parse_number("SLOPEQUEST_QUESTIONS_PER_LEVEL", &raw)?;
        }
        if let Some(key) = var("SLOPEQUEST_API_KEY") {
            self.server.api_key = Some(key);
        }
        if let Some(raw) = var("SLOPEQUEST_RATE_LIMIT") {
            self.server.rate_limit = parse_number("SLOPEQUEST_RATE_LIMIT", &raw)?;
        }
        if let Some(origins) = var("SLOPEQUEST_CORS_ORIGINS") {
            self.server.cors_origins = Some(origins);
        }
        Ok(())
    }

    /// Path of the local profile database.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("profile.redb")
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, QuizError> {
    raw.trim()
        .parse()
        .map_err(|_| QuizError::InvalidConfig(format!("{} must be a number, got '{}'", key, raw)))
}

// =============================================================================
// TESTS
// =============================================================================
