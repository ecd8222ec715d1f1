//! Boss state, turn protocol and per-boss behaviors
//!
//! Each boss id maps to a `BossBehavior` with optional hooks. The attack
//! hook runs when the player goes `attack_rate` moves without damaging the
//! boss; the turn-end hook runs after every move. Ids without scripted
//! behavior map to an explicit empty entry.

use crate::board::{Block, Board, Cell};
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ATTACK_RATE: u32 = 3;

/// Known bosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossId {
    /// Elite: drops coal
    Magmor,
    /// Elite: regenerates when left alone
    Pyra,
    /// World boss: coal, regeneration and petrification
    Ignis,
    #[serde(other)]
    Unknown,
}

impl BossId {
    pub fn name(&self) -> &'static str {
        match self {
            BossId::Magmor => "Magmor",
            BossId::Pyra => "Pyra",
            BossId::Ignis => "Ignis",
            BossId::Unknown => "Unknown",
        }
    }
}

/// Boss section of a level file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossConfig {
    pub id: BossId,
    pub max_hp: u32,
    /// Overrides the rules' attack rate
    #[serde(default)]
    pub attack_rate: Option<u32>,
}

/// Cadences and amounts used by the boss hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Turns between coal drops
    pub obstacle_every: u32,
    /// Damage-free turns before regenerating
    pub regen_after: u32,
    pub regen_amount: u32,
    /// Turns between petrifications
    pub petrify_every: u32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            obstacle_every: 5,
            regen_after: 3,
            regen_amount: 2,
            petrify_every: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BossPhase {
    Inactive,
    Active,
    Defeated,
}

/// Something a boss did during its turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BossEvent {
    Attacked,
    ObstacleDropped { row: usize, col: usize },
    Regenerated { amount: u32 },
    Petrified { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BossState {
    pub id: BossId,
    pub phase: BossPhase,
    pub max_hp: u32,
    pub current_hp: u32,
    pub attack_rate: u32,
    pub moves_without_damage: u32,
    /// Boss turns taken this session
    pub turn_count: u32,
    regen_streak: u32,
    last_hp_check: u32,
}

impl Default for BossState {
    fn default() -> Self {
        Self::inactive()
    }
}

impl BossState {
    /// No boss on this level
    pub fn inactive() -> Self {
        Self {
            id: BossId::Unknown,
            phase: BossPhase::Inactive,
            max_hp: 0,
            current_hp: 0,
            attack_rate: DEFAULT_ATTACK_RATE,
            moves_without_damage: 0,
            turn_count: 0,
            regen_streak: 0,
            last_hp_check: 0,
        }
    }

    pub fn new(config: &BossConfig, default_attack_rate: u32) -> Self {
        Self {
            id: config.id,
            phase: BossPhase::Active,
            max_hp: config.max_hp,
            current_hp: config.max_hp,
            attack_rate: config.attack_rate.unwrap_or(default_attack_rate).max(1),
            moves_without_damage: 0,
            turn_count: 0,
            regen_streak: 0,
            last_hp_check: config.max_hp,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == BossPhase::Active
    }

    pub fn is_defeated(&self) -> bool {
        self.phase == BossPhase::Defeated
    }

    /// Back to full health for a retry
    pub fn reset(&mut self) {
        if self.phase == BossPhase::Inactive {
            return;
        }
        self.phase = BossPhase::Active;
        self.current_hp = self.max_hp;
        self.moves_without_damage = 0;
        self.turn_count = 0;
        self.regen_streak = 0;
        self.last_hp_check = self.max_hp;
    }

    /// Apply damage, clamping at zero. Returns true when this blow
    /// defeated the boss.
    pub fn damage(&mut self, amount: u32) -> bool {
        if !self.is_active() || amount == 0 {
            return false;
        }
        self.current_hp = self.current_hp.saturating_sub(amount);
        if self.current_hp == 0 {
            self.phase = BossPhase::Defeated;
            return true;
        }
        false
    }

    /// Heal up to max HP, returning how much was restored
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_add(amount).min(self.max_hp);
        self.current_hp - before
    }

    /// Run the boss's side of a completed player move
    pub fn end_turn(
        &mut self,
        damage_dealt: bool,
        board: &mut Board,
        rng: &mut dyn RngCore,
        tuning: &BossTuning,
    ) -> Vec<BossEvent> {
        if !self.is_active() {
            return Vec::new();
        }
        let behavior = BossBehavior::for_boss(self.id);
        let mut events = Vec::new();
        self.turn_count += 1;

        let mut attack = false;
        if damage_dealt {
            self.moves_without_damage = 0;
        } else {
            self.moves_without_damage += 1;
            if self.moves_without_damage >= self.attack_rate {
                self.moves_without_damage = 0;
                attack = true;
                events.push(BossEvent::Attacked);
            }
        }

        let mut ctx = BossContext {
            boss: self,
            board,
            rng,
            tuning,
            events: &mut events,
        };
        if attack {
            if let Some(hook) = behavior.on_attack {
                hook(&mut ctx);
            }
        }
        if let Some(hook) = behavior.on_turn_end {
            hook(&mut ctx);
        }
        events
    }
}

/// What a boss hook may touch
pub struct BossContext<'a> {
    pub boss: &'a mut BossState,
    pub board: &'a mut Board,
    pub rng: &'a mut dyn RngCore,
    pub tuning: &'a BossTuning,
    pub events: &'a mut Vec<BossEvent>,
}

pub type BossHook = fn(&mut BossContext<'_>);

#[derive(Debug, Clone, Copy)]
pub struct BossBehavior {
    pub on_attack: Option<BossHook>,
    pub on_turn_end: Option<BossHook>,
}

static NO_BEHAVIOR: BossBehavior = BossBehavior {
    on_attack: None,
    on_turn_end: None,
};

static MAGMOR: BossBehavior = BossBehavior {
    on_attack: None,
    on_turn_end: Some(periodic_coal),
};

static PYRA: BossBehavior = BossBehavior {
    on_attack: None,
    on_turn_end: Some(regenerate),
};

static IGNIS: BossBehavior = BossBehavior {
    on_attack: Some(drop_coal),
    on_turn_end: Some(ignis_turn_end),
};

impl BossBehavior {
    pub fn for_boss(id: BossId) -> &'static BossBehavior {
        match id {
            BossId::Magmor => &MAGMOR,
            BossId::Pyra => &PYRA,
            BossId::Ignis => &IGNIS,
            BossId::Unknown => &NO_BEHAVIOR,
        }
    }
}

fn every(turn: u32, period: u32) -> bool {
    period > 0 && turn % period == 0
}

fn drop_coal(ctx: &mut BossContext<'_>) {
    let empty = ctx.board.empty_cells();
    if let Some(&(row, col)) = empty.choose(&mut *ctx.rng) {
        ctx.board
            .set(row as i32, col as i32, Cell::Filled(Block::obstacle("coal")));
        ctx.events.push(BossEvent::ObstacleDropped { row, col });
    }
}

fn periodic_coal(ctx: &mut BossContext<'_>) {
    if every(ctx.boss.turn_count, ctx.tuning.obstacle_every) {
        drop_coal(ctx);
    }
}

/// Heal after `regen_after` turns in which HP did not drop
fn regenerate(ctx: &mut BossContext<'_>) {
    let boss = &mut *ctx.boss;
    if boss.current_hp < boss.last_hp_check {
        boss.regen_streak = 0;
    } else {
        boss.regen_streak += 1;
    }
    if ctx.tuning.regen_after > 0 && boss.regen_streak >= ctx.tuning.regen_after {
        let healed = boss.heal(ctx.tuning.regen_amount);
        boss.regen_streak = 0;
        if healed > 0 {
            ctx.events.push(BossEvent::Regenerated { amount: healed });
        }
    }
    boss.last_hp_check = boss.current_hp;
}

/// Turn every fire item on the board into stone
fn petrify_fire(ctx: &mut BossContext<'_>) {
    if !every(ctx.boss.turn_count, ctx.tuning.petrify_every) {
        return;
    }
    let count = ctx.board.transform_where(
        |block| matches!(block, Block::Item { key, .. } if key == "fire"),
        &Block::obstacle("stone"),
    );
    if count > 0 {
        ctx.events.push(BossEvent::Petrified { count });
    }
}

fn ignis_turn_end(ctx: &mut BossContext<'_>) {
    periodic_coal(ctx);
    regenerate(ctx);
    petrify_fire(ctx);
}
