//! Power-ups, hero strikes and the inventory they are paid from

use crate::board::{BOARD_SIZE, Board, ClearedCell};
use crate::combo::Hero;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_INVENTORY_CAP: u32 = 3;

/// Consumable power-ups earned in the reward room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUp {
    /// Clears the 3x3 square around a cell
    Bomb,
    /// Rotates a hand piece clockwise
    Rotate,
    /// Exchanges a hand piece for a fresh one
    Swap,
}

impl PowerUp {
    pub fn all() -> [PowerUp; 3] {
        [PowerUp::Bomb, PowerUp::Rotate, PowerUp::Swap]
    }

    pub fn key(&self) -> &'static str {
        match self {
            PowerUp::Bomb => "bomb",
            PowerUp::Rotate => "rotate",
            PowerUp::Swap => "swap",
        }
    }
}

/// Per-type counts kept outside a session, each capped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub counts: BTreeMap<String, u32>,
    pub cap: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_CAP)
    }
}

impl Inventory {
    pub fn new(cap: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            cap,
        }
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: &str, count: u32) {
        self.counts.insert(key.to_string(), count);
    }

    pub fn is_full(&self, key: &str) -> bool {
        self.count(key) >= self.cap
    }

    /// Whether every power-up type, every stocked type and `keys` are all
    /// at the cap
    pub fn uniformly_full<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        PowerUp::all().iter().all(|power| self.is_full(power.key()))
            && self.counts.values().all(|&count| count >= self.cap)
            && keys.into_iter().all(|key| self.is_full(key))
    }

    /// Add one unless the type is capped
    pub fn grant(&mut self, key: &str) -> bool {
        if self.is_full(key) {
            return false;
        }
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
        true
    }

    /// Spend one
    pub fn consume(&mut self, key: &str) -> bool {
        match self.counts.get_mut(key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Second half of the X slash, waiting for the shell's go-ahead
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSecondPhase {
    pub hero: Hero,
    pub cells: Vec<(usize, usize)>,
    /// Earliest time the shell should apply it
    pub due_ms: u64,
}

fn in_bounds(row: i32, col: i32) -> Option<(usize, usize)> {
    let size = BOARD_SIZE as i32;
    (row >= 0 && row < size && col >= 0 && col < size).then_some((row as usize, col as usize))
}

fn targets(points: impl IntoIterator<Item = (i32, i32)>) -> Vec<(usize, usize)> {
    points
        .into_iter()
        .filter_map(|(row, col)| in_bounds(row, col))
        .collect()
}

/// 3x3 square centred on the cell
pub fn bomb_area(row: i32, col: i32) -> Vec<(usize, usize)> {
    targets((row - 1..=row + 1).flat_map(|r| (col - 1..=col + 1).map(move |c| (r, c))))
}

/// Target cell and its left and right neighbours
pub fn horizontal_strike(row: i32, col: i32) -> Vec<(usize, usize)> {
    targets((col - 1..=col + 1).map(|c| (row, c)))
}

/// Entire column of the target
pub fn column_strike(row: i32, col: i32) -> Vec<(usize, usize)> {
    if in_bounds(row, col).is_none() {
        return Vec::new();
    }
    targets((0..BOARD_SIZE as i32).map(|r| (r, col)))
}

/// The two halves of the X slash: main diagonal through the centre,
/// then the remaining anti-diagonal corners
pub fn x_slash(row: i32, col: i32) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    if in_bounds(row, col).is_none() {
        return (Vec::new(), Vec::new());
    }
    let first = targets([(row - 1, col - 1), (row, col), (row + 1, col + 1)]);
    let second = targets([(row - 1, col + 1), (row + 1, col - 1)]);
    (first, second)
}

/// Whether any of the cells holds a block a strike could remove
pub fn has_targets(board: &Board, cells: &[(usize, usize)]) -> bool {
    cells.iter().any(|&(row, col)| {
        board
            .get(row as i32, col as i32)
            .and_then(|cell| cell.block())
            .is_some_and(|block| !block.is_terrain())
    })
}

/// Remove every clearable block in `cells`, in the given order
pub fn strike(board: &mut Board, cells: &[(usize, usize)]) -> Vec<ClearedCell> {
    cells
        .iter()
        .filter_map(|&(row, col)| board.take(row, col).map(|block| ClearedCell { row, col, block }))
        .collect()
}
