//! Combo tracking and the hero abilities it unlocks

use serde::{Deserialize, Serialize};

pub const DEFAULT_COMBO_WINDOW_MS: u64 = 5000;

/// Consecutive clears inside a rolling time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboTracker {
    count: u32,
    last_clear_ms: Option<u64>,
    window_ms: u64,
}

impl Default for ComboTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COMBO_WINDOW_MS)
    }
}

impl ComboTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            count: 0,
            last_clear_ms: None,
            window_ms,
        }
    }

    /// Register a clearing pass at `now_ms`. Passes that cleared nothing
    /// leave the combo alone.
    pub fn register_clear(&mut self, now_ms: u64, lines: usize) -> u32 {
        if lines == 0 {
            return self.count;
        }
        let within_window = self
            .last_clear_ms
            .is_some_and(|last| now_ms.saturating_sub(last) <= self.window_ms);
        self.count = if within_window { self.count + 1 } else { 1 };
        self.last_clear_ms = Some(now_ms);
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Score multiplier, never below 1
    pub fn multiplier(&self) -> u32 {
        self.count.max(1)
    }

    pub fn last_clear_ms(&self) -> Option<u64> {
        self.last_clear_ms
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_clear_ms = None;
    }
}

/// Heroes whose strikes are unlocked by combos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hero {
    /// Horizontal strike, three cells
    Thalion,
    /// Vertical strike, whole column
    Nyx,
    /// The player's own two-phase X slash
    Player,
}

impl Hero {
    pub fn all() -> [Hero; 3] {
        [Hero::Thalion, Hero::Nyx, Hero::Player]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Hero::Thalion => "thalion",
            Hero::Nyx => "nyx",
            Hero::Player => "player",
        }
    }
}

/// Combo counts at which each hero becomes available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroThresholds {
    pub thalion: u32,
    pub nyx: u32,
    pub player: u32,
}

impl Default for HeroThresholds {
    fn default() -> Self {
        Self {
            thalion: 2,
            nyx: 3,
            player: 4,
        }
    }
}

impl HeroThresholds {
    pub fn for_hero(&self, hero: Hero) -> u32 {
        match hero {
            Hero::Thalion => self.thalion,
            Hero::Nyx => self.nyx,
            Hero::Player => self.player,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeroGate {
    pub hero: Hero,
    pub threshold: u32,
    pub unlocked: bool,
    pub uses: u32,
}

/// Renewable hero gates: reaching the threshold again re-arms a hero
/// even after it was spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroRoster {
    gates: Vec<HeroGate>,
}

impl HeroRoster {
    pub fn new(thresholds: &HeroThresholds) -> Self {
        Self {
            gates: Hero::all()
                .into_iter()
                .map(|hero| HeroGate {
                    hero,
                    threshold: thresholds.for_hero(hero),
                    unlocked: false,
                    uses: 0,
                })
                .collect(),
        }
    }

    /// Arm every hero whose threshold the combo meets.
    /// Returns the heroes that were not armed before.
    pub fn rearm(&mut self, combo: u32) -> Vec<Hero> {
        let mut armed = Vec::new();
        for gate in &mut self.gates {
            if gate.threshold > 0 && combo >= gate.threshold && !gate.unlocked {
                gate.unlocked = true;
                armed.push(gate.hero);
            }
        }
        armed
    }

    pub fn is_unlocked(&self, hero: Hero) -> bool {
        self.gate(hero).is_some_and(|gate| gate.unlocked)
    }

    /// Spend an armed hero
    pub fn consume(&mut self, hero: Hero) -> bool {
        match self.gates.iter_mut().find(|gate| gate.hero == hero) {
            Some(gate) if gate.unlocked => {
                gate.unlocked = false;
                gate.uses += 1;
                true
            }
            _ => false,
        }
    }

    pub fn gate(&self, hero: Hero) -> Option<&HeroGate> {
        self.gates.iter().find(|gate| gate.hero == hero)
    }

    pub fn gates(&self) -> &[HeroGate] {
        &self.gates
    }
}
