//! # Game Primitives
//!
//! Compiled-in constants for the SlopeQuest core.
//!
//! Most of these are defaults: `GameConfig` may override the gameplay numbers,
//! but the record format constants are fixed for a given build.

// =============================================================================
// GAMEPLAY DEFAULTS
// =============================================================================

/// Questions a player answers before moving to the next level.
pub const QUESTIONS_PER_LEVEL: u32 = 10;

/// Submissions allowed per question before it resolves as wrong.
pub const ATTEMPTS_PER_QUESTION: u32 = 3;

/// Score and coins awarded for a correct answer on level 1.
pub const LEVEL_ONE_REWARD: u64 = 10;

/// Score and coins awarded for a correct answer on level 2 and above.
pub const ADVANCED_REWARD: u64 = 20;

/// Coin price of one shop item (and of the colored point variant).
pub const ITEM_PRICE: u64 = 10;

/// Number of point skins offered by the shop.
pub const SHOP_ITEM_COUNT: u32 = 4;

/// The skin every player owns from the start.
pub const DEFAULT_ITEM: u32 = 0;

/// Arriving at this level for the first time raises the one-time notice.
pub const LEVEL_UP_NOTICE_LEVEL: u32 = 2;

/// First level of a fresh profile.
pub const FIRST_LEVEL: u32 = 1;

// =============================================================================
// ANSWER CHECKING
// =============================================================================

/// Relative tolerance used when comparing a submitted slope to the canonical one.
///
/// Scaled by `max(1, |a|, |b|)` so that large slopes are not held to an
/// absolute epsilon they cannot meet.
pub const ANSWER_TOLERANCE: f64 = 1e-6;

/// Level 2+ answers are rounded to this many decimal places.
pub const ADVANCED_DECIMALS: i32 = 2;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length (in characters) of a player name.
pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Maximum length (in bytes) of a raw answer string.
pub const MAX_ANSWER_LENGTH: usize = 64;

// =============================================================================
// RECORD FORMAT
// =============================================================================

/// Magic bytes for the local profile record header.
pub const MAGIC_BYTES: &[u8; 4] = b"SLPQ";

/// Current profile record format version.
///
/// Increment this when making breaking changes to `ProgressState`'s layout.
pub const FORMAT_VERSION: u8 = 1;

/// Store key holding the versioned profile record.
pub const PROFILE_RECORD_KEY: &str = "profile.record";
