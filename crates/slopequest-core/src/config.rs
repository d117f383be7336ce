//! # Game Configuration
//!
//! Gameplay numbers that a deployment may tune. Defaults come from
//! [`crate::primitives`]; the binary layers TOML and environment overrides
//! on top before handing a validated `GameConfig` to the session.

use crate::primitives::{
    ADVANCED_REWARD, ATTEMPTS_PER_QUESTION, DEFAULT_ITEM, ITEM_PRICE, LEVEL_ONE_REWARD,
    QUESTIONS_PER_LEVEL, SHOP_ITEM_COUNT,
};
use crate::QuizError;
use serde::{Deserialize, Serialize};

/// Tunable gameplay parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Questions per level before the level counter advances.
    pub questions_per_level: u32,
    /// Submissions allowed per question.
    pub attempts_per_question: u32,
    /// Reward (score and coins) on level 1.
    pub level_one_reward: u64,
    /// Reward (score and coins) on level 2 and above.
    pub advanced_reward: u64,
    /// Number of items in the shop catalog.
    pub shop_item_count: u32,
    /// Coin price of a shop item.
    pub item_price: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            questions_per_level: QUESTIONS_PER_LEVEL,
            attempts_per_question: ATTEMPTS_PER_QUESTION,
            level_one_reward: LEVEL_ONE_REWARD,
            advanced_reward: ADVANCED_REWARD,
            shop_item_count: SHOP_ITEM_COUNT,
            item_price: ITEM_PRICE,
        }
    }
}

impl GameConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.questions_per_level == 0 {
            return Err(QuizError::InvalidConfig(
                "questions_per_level must be at least 1".to_string(),
            ));
        }
        if self.attempts_per_question == 0 {
            return Err(QuizError::InvalidConfig(
                "attempts_per_question must be at least 1".to_string(),
            ));
        }
        if self.shop_item_count <= DEFAULT_ITEM {
            return Err(QuizError::InvalidConfig(format!(
                "shop_item_count must include the default item {}",
                DEFAULT_ITEM
            )));
        }
        Ok(())
    }

    /// Reward for a correct answer on `level`.
    #[must_use]
    pub fn reward_for_level(&self, level: u32) -> u64 {
        if level <= 1 {
            self.level_one_reward
        } else {
            self.advanced_reward
        }
    }
}
