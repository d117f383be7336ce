//! # Profile Cache
//!
//! Maps `ProgressState` onto a `KeyValueStore`.
//!
//! The current layout is a single versioned record under
//! [`PROFILE_RECORD_KEY`]. Older installs kept one scalar per field; those
//! are read once through [`legacy_keys`] and replaced by the record on the
//! next write.

use super::KeyValueStore;
use crate::formats::{profile_from_bytes, profile_to_bytes};
use crate::primitives::{DEFAULT_ITEM, FIRST_LEVEL, PROFILE_RECORD_KEY};
use crate::{ProgressState, QuizError, Settings};

/// Key names of the flat, one-scalar-per-field layout.
pub mod legacy_keys {
    pub const PLAYER_ID: &str = "PlayerID";
    pub const CURRENT_LEVEL: &str = "CurrentLevel";
    pub const CURRENT_QUESTION: &str = "CurrentQuestion";
    pub const SCORE: &str = "Score";
    pub const COINS: &str = "Coins";
    pub const CORRECT_ANSWERS: &str = "CorrectAnswers";
    pub const WRONG_ANSWERS: &str = "WrongAnswers";
    pub const COLORED_VARIANT: &str = "ColoredPointsPurchased";
    pub const SELECTED_ITEM: &str = "SelectedPrefabIndex";
    pub const HAPTIC_INTENSITY: &str = "HapticIntensity";
    pub const AUDIO_VOLUME: &str = "AudioVolume";
    pub const LEVEL_UP_NOTICE: &str = "Level2PopupShown";

    /// Prefix of the per-item purchase flags (`PrefabPurchased_<index>`).
    pub const PURCHASED_PREFIX: &str = "PrefabPurchased_";

    /// Every fixed legacy key.
    pub const ALL: [&str; 12] = [
        PLAYER_ID,
        CURRENT_LEVEL,
        CURRENT_QUESTION,
        SCORE,
        COINS,
        CORRECT_ANSWERS,
        WRONG_ANSWERS,
        COLORED_VARIANT,
        SELECTED_ITEM,
        HAPTIC_INTENSITY,
        AUDIO_VOLUME,
        LEVEL_UP_NOTICE,
    ];

    /// Purchase flag key for one item.
    #[must_use]
    pub fn purchased(item: u32) -> String {
        format!("{}{}", PURCHASED_PREFIX, item)
    }
}

/// Where a loaded profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// The versioned record.
    Record,
    /// The flat legacy keys; should be migrated.
    Legacy,
    /// Nothing stored; first launch on this device.
    Empty,
}

/// Reads and writes the profile through a `KeyValueStore`.
pub struct ProfileCache;

impl ProfileCache {
    /// Load the profile, normalized against `questions_per_level`.
    ///
    /// `item_count` bounds the legacy purchase-flag scan.
    pub fn load(
        store: &dyn KeyValueStore,
        questions_per_level: u32,
        item_count: u32,
    ) -> Result<(ProgressState, ProfileSource), QuizError> {
        let (mut state, source) = if let Some(bytes) = store.get_bytes(PROFILE_RECORD_KEY)? {
            (profile_from_bytes(&bytes)?, ProfileSource::Record)
        } else if Self::has_legacy_layout(store)? {
            (Self::load_legacy(store, item_count), ProfileSource::Legacy)
        } else {
            (ProgressState::new(), ProfileSource::Empty)
        };

        if state.normalize(questions_per_level) {
            tracing::warn!(?source, "stored profile violated invariants and was repaired");
        }
        Ok((state, source))
    }

    /// Write the profile record and make it durable.
    pub fn store(store: &mut dyn KeyValueStore, state: &ProgressState) -> Result<(), QuizError> {
        store.set_bytes(PROFILE_RECORD_KEY, profile_to_bytes(state)?)?;
        store.save()
    }

    /// Check for any fixed legacy key.
    pub fn has_legacy_layout(store: &dyn KeyValueStore) -> Result<bool, QuizError> {
        for key in legacy_keys::ALL {
            if store.contains(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Stage removal of every legacy key. Takes effect on the next `save()`.
    pub fn remove_legacy(store: &mut dyn KeyValueStore, item_count: u32) -> Result<(), QuizError> {
        for key in legacy_keys::ALL {
            store.remove(key)?;
        }
        for item in 0..item_count {
            store.remove(&legacy_keys::purchased(item))?;
        }
        Ok(())
    }

    fn load_legacy(store: &dyn KeyValueStore, item_count: u32) -> ProgressState {
        use legacy_keys as k;

        let count = |key: &str| u64::try_from(store.get_int(key, 0)).unwrap_or(0);
        let index = |key: &str, default: u32| {
            u32::try_from(store.get_int(key, i64::from(default))).unwrap_or(default)
        };
        let flag = |key: &str| store.get_int(key, 0) == 1;

        let mut purchased_items: std::collections::BTreeSet<u32> = (0..item_count)
            .filter(|&item| flag(&k::purchased(item)))
            .collect();
        purchased_items.insert(DEFAULT_ITEM);

        ProgressState {
            player_id: store.get_string(k::PLAYER_ID, ""),
            current_level: index(k::CURRENT_LEVEL, FIRST_LEVEL),
            current_question: index(k::CURRENT_QUESTION, 0),
            score: count(k::SCORE),
            coins: count(k::COINS),
            correct_answers: count(k::CORRECT_ANSWERS),
            wrong_answers: count(k::WRONG_ANSWERS),
            purchased_items,
            selected_item: index(k::SELECTED_ITEM, DEFAULT_ITEM),
            colored_variant_purchased: flag(k::COLORED_VARIANT),
            level_up_notice_shown: flag(k::LEVEL_UP_NOTICE),
            settings: Settings::new(
                store.get_float(k::HAPTIC_INTENSITY, 1.0) as f32,
                store.get_float(k::AUDIO_VOLUME, 1.0) as f32,
            ),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn empty_store_yields_first_launch_profile() {
        let store = MemoryStore::new();
        let (state, source) = ProfileCache::load(&store, 10, 4).expect("load");
        assert_eq!(source, ProfileSource::Empty);
        assert_eq!(state, ProgressState::new());
    }

    #[test]
    fn record_roundtrip() {
        let mut store = MemoryStore::new();
        let mut state = ProgressState::new();
        state.player_id = "ada".to_string();
        state.coins = 55;

        ProfileCache::store(&mut store, &state).expect("store");
        let (loaded, source) = ProfileCache::load(&store, 10, 4).expect("load");

        assert_eq!(source, ProfileSource::Record);
        assert_eq!(loaded, state);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn legacy_layout_is_read() {
        use legacy_keys as k;
        let mut store = MemoryStore::new();
        store.set_string(k::PLAYER_ID, "lin").expect("set");
        store.set_int(k::CURRENT_LEVEL, 3).expect("set");
        store.set_int(k::CURRENT_QUESTION, 4).expect("set");
        store.set_int(k::SCORE, 250).expect("set");
        store.set_int(k::COINS, -5).expect("set");
        store.set_int(&k::purchased(2), 1).expect("set");
        store.set_int(k::SELECTED_ITEM, 2).expect("set");
        store.set_int(k::LEVEL_UP_NOTICE, 1).expect("set");
        store.set_float(k::AUDIO_VOLUME, 0.25).expect("set");

        let (state, source) = ProfileCache::load(&store, 10, 4).expect("load");

        assert_eq!(source, ProfileSource::Legacy);
        assert_eq!(state.player_id(), "lin");
        assert_eq!(state.current_level(), 3);
        assert_eq!(state.current_question(), 4);
        assert_eq!(state.score(), 250);
        assert_eq!(state.coins(), 0);
        assert!(state.owns(0));
        assert!(state.owns(2));
        assert_eq!(state.selected_item(), 2);
        assert!(state.level_up_notice_shown());
        assert_eq!(state.settings().audio_volume, 0.25);
    }

    #[test]
    fn legacy_selection_of_unowned_item_is_repaired() {
        let mut store = MemoryStore::new();
        store.set_int(legacy_keys::SELECTED_ITEM, 3).expect("set");

        let (state, _) = ProfileCache::load(&store, 10, 4).expect("load");
        assert_eq!(state.selected_item(), DEFAULT_ITEM);
    }

    #[test]
    fn remove_legacy_clears_flat_keys() {
        let mut store = MemoryStore::new();
        store.set_int(legacy_keys::SCORE, 10).expect("set");
        store.set_int(&legacy_keys::purchased(1), 1).expect("set");

        ProfileCache::remove_legacy(&mut store, 4).expect("remove");

        assert!(!ProfileCache::has_legacy_layout(&store).expect("check"));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let mut store = MemoryStore::new();
        store
            .set_bytes(PROFILE_RECORD_KEY, b"SLPQ\x01\xff\xff".to_vec())
            .expect("set");
        assert!(ProfileCache::load(&store, 10, 4).is_err());
    }
}
