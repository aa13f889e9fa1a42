//! アイテムカタログ
//!
//! 定義は起動時に一度だけ読み込まれ、以後変更されません。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{error::LoadError, value_object::ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    ExtraTime,
    ScoreMultiplier,
    SkipTurn,
    WordHint,
    Immunity,
    ScreenDistraction,
}

/// Who an item may be aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetPolicy {
    #[serde(rename = "SELF")]
    SelfOnly,
    Opponent,
    AllOpponents,
    CurrentPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub item_id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    /// Seconds for EXTRA_TIME and SCREEN_DISTRACTION, factor for
    /// SCORE_MULTIPLIER, candidate count for WORD_HINT
    pub magnitude: f64,
    pub cooldown_s: u64,
    pub cost: u32,
    pub rarity: Rarity,
    pub target_policy: TargetPolicy,
    /// Copies granted to a participant when they join a room
    #[serde(default)]
    pub starting_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, ItemDefinition>,
}

impl ItemCatalog {
    pub fn from_definitions(definitions: Vec<ItemDefinition>) -> Result<Self, LoadError> {
        let mut items = BTreeMap::new();
        for (index, definition) in definitions.into_iter().enumerate() {
            if !(definition.magnitude.is_finite() && definition.magnitude >= 0.0) {
                return Err(LoadError::Parse {
                    line: index + 1,
                    reason: format!("item '{}' has invalid magnitude", definition.item_id),
                });
            }
            if items.contains_key(&definition.item_id) {
                return Err(LoadError::Parse {
                    line: index + 1,
                    reason: format!("duplicate item id '{}'", definition.item_id),
                });
            }
            items.insert(definition.item_id.clone(), definition);
        }
        if items.is_empty() {
            return Err(LoadError::Empty("item catalog"));
        }
        Ok(Self { items })
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&ItemDefinition> {
        self.items.get(item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    /// Inventory handed to a newly joined participant
    pub fn starting_inventory(&self) -> BTreeMap<ItemId, u32> {
        self.items
            .values()
            .filter(|d| d.starting_count > 0)
            .map(|d| (d.item_id.clone(), d.starting_count))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
