//! Game modes and level files

use crate::board::Block;
use crate::boss::BossConfig;
use crate::error::{Error, Result};
use crate::generator::{ItemPool, ItemWeight};
use crate::goals::VictoryRule;
use crate::settings::Rules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Goals of the endless casual board
pub const CASUAL_GOALS: [(&str, u32); 3] = [("bee", 10), ("ghost", 10), ("cop", 10)];

/// Goals of the reward room
pub const BONUS_GOALS: [(&str, u32); 3] = [("bomb", 10), ("rotate", 10), ("swap", 10)];

/// Available game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Casual,
    Adventure,
    Bonus,
}

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Casual => "Casual",
            GameMode::Adventure => "Adventure",
            GameMode::Bonus => "Bonus",
        }
    }

    /// Heroes are only summoned in adventure levels
    pub fn has_heroes(&self) -> bool {
        *self == GameMode::Adventure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    #[default]
    Normal,
    Boss,
    Bonus,
}

impl LevelKind {
    pub fn victory_rule(&self) -> VictoryRule {
        match self {
            LevelKind::Bonus => VictoryRule::FirstGoal,
            LevelKind::Normal | LevelKind::Boss => VictoryRule::AllGoals,
        }
    }
}

/// A block placed on the board before the first move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileOverlay {
    pub row: usize,
    pub col: usize,
    pub block: Block,
}

impl TileOverlay {
    pub fn lava(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            block: Block::lava(),
        }
    }
}

/// One level as read from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: LevelKind,
    #[serde(default)]
    pub goals: BTreeMap<String, u32>,
    /// Item whitelist for the piece generator
    #[serde(default)]
    pub items: Vec<ItemWeight>,
    #[serde(default)]
    pub grid: Vec<TileOverlay>,
    #[serde(default)]
    pub boss: Option<BossConfig>,
}

fn goal_map(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
    pairs.iter().map(|&(key, target)| (key.to_string(), target)).collect()
}

impl LevelConfig {
    /// The casual board, played as level 0
    pub fn casual() -> Self {
        Self {
            id: 0,
            name: Some("Casual".to_string()),
            kind: LevelKind::Normal,
            goals: goal_map(&CASUAL_GOALS),
            items: ItemPool::casual().entries().to_vec(),
            grid: Vec::new(),
            boss: None,
        }
    }

    /// The reward room
    pub fn bonus() -> Self {
        Self {
            id: 0,
            name: Some("Treasure Room".to_string()),
            kind: LevelKind::Bonus,
            goals: goal_map(&BONUS_GOALS),
            items: BONUS_GOALS
                .iter()
                .map(|&(key, _)| ItemWeight::new(key, crate::generator::DEFAULT_ITEM_WEIGHT))
                .collect(),
            grid: Vec::new(),
            boss: None,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("Level {}", self.id))
    }

    pub fn is_boss(&self) -> bool {
        self.kind == LevelKind::Boss && self.boss.is_some()
    }

    pub fn item_pool(&self) -> ItemPool {
        ItemPool::for_items(&self.items)
    }

    /// Goals the session will track. Boss levels are won by defeating the
    /// boss and keep whatever goals they list. Any other level with no
    /// goals gets one goal per whitelisted item, or the casual set.
    pub fn resolved_goals(&self, rules: &Rules) -> BTreeMap<String, u32> {
        if !self.goals.is_empty() || self.is_boss() {
            return self.goals.clone();
        }
        let pool = self.item_pool();
        let mut goals: BTreeMap<String, u32> = pool
            .item_keys()
            .map(|key| (key.to_string(), rules.fallback_goal_target))
            .collect();
        if goals.is_empty() || self.items.is_empty() {
            goals = match self.kind {
                LevelKind::Bonus => goal_map(&BONUS_GOALS),
                _ => goal_map(&CASUAL_GOALS),
            };
        }
        tracing::warn!("Level {} has no goals, falling back to {:?}", self.id, goals);
        goals
    }
}
