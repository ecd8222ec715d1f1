//! Settings persistence using TOML
//!
//! Stores rule tunables and player progress in
//! ~/.config/blocklands/settings.toml (or platform equivalent)

use crate::boss::{BossTuning, DEFAULT_ATTACK_RATE};
use crate::combo::{DEFAULT_COMBO_WINDOW_MS, HeroThresholds};
use crate::error::{Error, Result};
use crate::powers::{DEFAULT_INVENTORY_CAP, Inventory};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Saved settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gameplay tunables
    pub rules: Rules,
    /// Unlocked levels, power-ups and best score
    pub progress: Progress,
}

/// Every number the rules engine treats as tunable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Max gap between clears that still extends a combo
    pub combo_window_ms: u64,
    /// Damage-free moves before a boss attacks
    pub attack_rate: u32,
    pub points_per_line: u64,
    /// Boss damage of items that carry no damage value
    pub default_item_damage: u32,
    /// Per-type power-up cap
    pub inventory_cap: u32,
    /// Target used when a level lists items but no goals
    pub fallback_goal_target: u32,
    /// Pause the shell should leave before the second half of the X slash
    pub second_phase_delay_ms: u64,
    pub heroes: HeroThresholds,
    pub boss: BossTuning,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            combo_window_ms: DEFAULT_COMBO_WINDOW_MS,
            attack_rate: DEFAULT_ATTACK_RATE,
            points_per_line: 10,
            default_item_damage: 1,
            inventory_cap: DEFAULT_INVENTORY_CAP,
            fallback_goal_target: 10,
            second_phase_delay_ms: 1000,
            heroes: HeroThresholds::default(),
            boss: BossTuning::default(),
        }
    }
}

/// What survives between sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Highest adventure level that can be played
    pub max_unlocked_level: u32,
    pub inventory: Inventory,
    pub best_casual_score: u64,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            max_unlocked_level: 1,
            inventory: Inventory::default(),
            best_casual_score: 0,
        }
    }
}

impl Progress {
    /// Unlock up to `level`. Returns true if it was newly unlocked.
    pub fn unlock(&mut self, level: u32) -> bool {
        if level > self.max_unlocked_level {
            self.max_unlocked_level = level;
            return true;
        }
        false
    }

    /// Add a power-up won in the reward room, respecting the cap
    pub fn grant_reward(&mut self, key: &str) -> bool {
        self.inventory.grant(key)
    }

    /// Keep the best casual score. Returns true on a new record.
    pub fn record_casual_score(&mut self, score: u64) -> bool {
        if score > self.best_casual_score {
            self.best_casual_score = score;
            return true;
        }
        false
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blocklands", "blocklands")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the config dir, or defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("No config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable settings: {}", e);
            Self::default()
        })
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut settings: Settings = toml::from_str(&contents)?;
        settings.progress.inventory.cap = settings.rules.inventory_cap;
        Ok(settings)
    }

    /// Save settings to the config dir
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().ok_or(Error::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save settings to an explicit file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| Error::io(path, e))?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }
}
