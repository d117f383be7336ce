//! # Purchase Ledger
//!
//! Coin spending, the owned-item set and the equipped item.
//!
//! Item 0 is always owned, so there is always something to equip. Coins are
//! never driven below zero: a spend that cannot be covered changes nothing.

use crate::config::GameConfig;
use crate::{ProgressState, QuizError};
use serde::Serialize;

/// Result of a shop interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ShopOutcome {
    /// The item was bought and equipped.
    Purchased { item: u32, coins_left: u64 },
    /// The item was already owned and is now equipped.
    Selected { item: u32 },
    /// The colored point style was unlocked.
    ColoredUnlocked { coins_left: u64 },
    /// Nothing to buy; the colored style is already unlocked.
    AlreadyOwned,
    /// Not enough coins. Nothing changed.
    InsufficientFunds { needed: u64, available: u64 },
}

/// Shop rules for one catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLedger {
    item_count: u32,
    item_price: u64,
}

impl PurchaseLedger {
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            item_count: config.shop_item_count,
            item_price: config.item_price,
        }
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub fn item_price(&self) -> u64 {
        self.item_price
    }

    /// Deduct `amount` if affordable. Returns whether coins were spent.
    pub fn spend_coins(&self, state: &mut ProgressState, amount: u64) -> bool {
        match state.coins.checked_sub(amount) {
            Some(left) => {
                state.coins = left;
                true
            }
            None => false,
        }
    }

    /// Mark `item` as owned. Returns `false` if it already was.
    pub fn purchase(&self, state: &mut ProgressState, item: u32) -> Result<bool, QuizError> {
        self.check_item(item)?;
        Ok(state.purchased_items.insert(item))
    }

    /// Equip an owned item.
    pub fn select(&self, state: &mut ProgressState, item: u32) -> Result<(), QuizError> {
        self.check_item(item)?;
        if !state.owns(item) {
            return Err(QuizError::ItemNotOwned(item));
        }
        state.selected_item = item;
        Ok(())
    }

    /// A shop click: equip the item if owned, otherwise try to buy it.
    pub fn buy_or_select(
        &self,
        state: &mut ProgressState,
        item: u32,
    ) -> Result<ShopOutcome, QuizError> {
        self.check_item(item)?;
        if state.owns(item) {
            state.selected_item = item;
            return Ok(ShopOutcome::Selected { item });
        }
        if !self.spend_coins(state, self.item_price) {
            return Ok(ShopOutcome::InsufficientFunds {
                needed: self.item_price,
                available: state.coins,
            });
        }
        self.purchase(state, item)?;
        state.selected_item = item;
        tracing::info!(item, coins_left = state.coins, "item purchased");
        Ok(ShopOutcome::Purchased {
            item,
            coins_left: state.coins,
        })
    }

    /// Unlock the colored point style.
    pub fn purchase_colored_variant(&self, state: &mut ProgressState) -> ShopOutcome {
        if state.colored_variant_purchased {
            return ShopOutcome::AlreadyOwned;
        }
        if !self.spend_coins(state, self.item_price) {
            return ShopOutcome::InsufficientFunds {
                needed: self.item_price,
                available: state.coins,
            };
        }
        state.colored_variant_purchased = true;
        tracing::info!(coins_left = state.coins, "colored points unlocked");
        ShopOutcome::ColoredUnlocked {
            coins_left: state.coins,
        }
    }

    fn check_item(&self, item: u32) -> Result<(), QuizError> {
        if item < self.item_count {
            Ok(())
        } else {
            Err(QuizError::UnknownItem(item))
        }
    }
}
