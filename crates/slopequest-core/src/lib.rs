//! # slopequest-core
//!
//! Player progress and quiz session engine for SlopeQuest - THE GAME LOGIC.
//!
//! The player picks two points on a grid and enters the slope of the line
//! through them. This crate owns everything that has to stay correct across
//! restarts and flaky networks:
//!
//! - `types`: the profile (`ProgressState`) and error type (`QuizError`)
//! - `quiz`: slope math and the per-question attempt state machine
//! - `ledger`: coins, purchases and the equipped item
//! - `storage` / `formats`: the local key-value cache and its versioned record
//! - `remote`: the remote profile store and its single-flight writer
//! - `reconcile`: merging local and remote profiles on load, saving on change
//! - `session`: `GameSession`, the one handle presentation layers talk to
//!
//! ## Constraints
//!
//! - No async and no network code here; remote I/O sits behind a trait
//! - Every mutation is persisted locally before the call returns
//! - Nothing is fatal: the worst case is local-only persistence

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod events;
pub mod formats;
pub mod ledger;
pub mod primitives;
pub mod quiz;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{GridPoint, ProgressState, QuizError, Settings};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use config::GameConfig;
pub use events::{EventSink, EventValue, GameEvent, RecordingSink, TracingSink};
pub use ledger::{PurchaseLedger, ShopOutcome};
pub use quiz::{
    AdvanceOutcome, AnswerOutcome, QuestionAttempt, QuestionPhase, QuizEngine, answers_match,
    canonical_slope, format_slope, parse_answer,
};
pub use reconcile::{MergeReport, ReconciliationEngine, RemoteLink, merge_remote};
pub use session::GameSession;

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use formats::{RecordHeader, profile_from_bytes, profile_to_bytes};
pub use remote::{
    MemoryRemoteStore, OfflineRemoteStore, RemoteAccount, RemoteDocument, RemoteProfileStore,
    RemoteValue, RemoteWriter, WriterStats,
};
pub use storage::{KeyValueStore, MemoryStore, ProfileCache, ProfileSource, RedbStore, StoredValue};
