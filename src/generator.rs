//! Piece generation
//!
//! A random shape is picked from the catalog and each of its cells is
//! filled by weighted sampling from an item pool. The session only sees
//! the `PieceSource` trait, so tests can script the pieces they need.

use crate::board::Block;
use crate::piece::Piece;
use crate::shapes::SHAPES;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Pool key for plain filler blocks
pub const NORMAL_KEY: &str = "normal";
pub const DEFAULT_ITEM_WEIGHT: u32 = 4;
pub const FILLER_WEIGHT: u32 = 15;

fn default_weight() -> u32 {
    DEFAULT_ITEM_WEIGHT
}

/// One entry of an item pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemWeight {
    pub key: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Boss damage carried by blocks of this kind
    #[serde(default)]
    pub damage: Option<u32>,
}

impl ItemWeight {
    pub fn new(key: &str, weight: u32) -> Self {
        Self {
            key: key.to_ascii_lowercase(),
            weight,
            damage: None,
        }
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn is_filler(&self) -> bool {
        self.key.eq_ignore_ascii_case(NORMAL_KEY)
    }

    /// The block a cell gets when this entry is drawn
    pub fn block(&self) -> Block {
        if self.is_filler() {
            Block::Normal
        } else {
            Block::Item {
                key: self.key.to_ascii_lowercase(),
                damage: self.damage,
            }
        }
    }
}

/// Weighted set of block kinds a piece's cells are drawn from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemPool {
    entries: Vec<ItemWeight>,
}

impl Default for ItemPool {
    fn default() -> Self {
        Self::casual()
    }
}

impl ItemPool {
    /// Casual mode pool
    pub fn casual() -> Self {
        Self {
            entries: vec![
                ItemWeight::new("bee", DEFAULT_ITEM_WEIGHT),
                ItemWeight::new("ghost", DEFAULT_ITEM_WEIGHT),
                ItemWeight::new("cop", DEFAULT_ITEM_WEIGHT),
                ItemWeight::new(NORMAL_KEY, FILLER_WEIGHT),
            ],
        }
    }

    /// Pool for a level's item whitelist, topped up with filler blocks.
    /// An empty whitelist falls back to the casual pool.
    pub fn for_items(items: &[ItemWeight]) -> Self {
        if items.is_empty() {
            return Self::casual();
        }
        let mut entries = items.to_vec();
        if !entries.iter().any(ItemWeight::is_filler) {
            entries.push(ItemWeight::new(NORMAL_KEY, FILLER_WEIGHT));
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[ItemWeight] {
        &self.entries
    }

    /// Collectible keys in the pool, filler excluded
    pub fn item_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_filler())
            .map(|entry| entry.key.as_str())
    }

    /// Draw a block. Unweighted draws pick every entry with equal odds.
    /// A pool with no usable weights yields filler.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, weighted: bool) -> Block {
        let chosen = if weighted {
            WeightedIndex::new(self.entries.iter().map(|entry| entry.weight))
                .ok()
                .and_then(|dist| self.entries.get(dist.sample(rng)))
        } else {
            self.entries.choose(rng)
        };
        chosen.map_or(Block::Normal, ItemWeight::block)
    }
}

/// Anything that can deal pieces
pub trait PieceSource {
    fn next_piece(&mut self, pool: &ItemPool, use_weighted_stats: bool) -> Piece;
}

/// Seeded random generator over the full shape catalog
#[derive(Debug, Clone)]
pub struct RandomPieces {
    rng: ChaCha8Rng,
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPieces {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Same seed, same sequence of pieces
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PieceSource for RandomPieces {
    fn next_piece(&mut self, pool: &ItemPool, use_weighted_stats: bool) -> Piece {
        let shape = SHAPES.choose(&mut self.rng).unwrap_or(&SHAPES[0]);
        let rng = &mut self.rng;
        Piece::filled(shape.name, shape.matrix, || pool.sample(rng, use_weighted_stats))
    }
}

/// Deals a scripted sequence of pieces, then single normal dots
#[derive(Debug, Clone, Default)]
pub struct FixedPieces {
    queue: VecDeque<Piece>,
}

impl FixedPieces {
    pub fn new(pieces: impl IntoIterator<Item = Piece>) -> Self {
        Self {
            queue: pieces.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl PieceSource for FixedPieces {
    fn next_piece(&mut self, _pool: &ItemPool, _use_weighted_stats: bool) -> Piece {
        self.queue
            .pop_front()
            .unwrap_or_else(|| Piece::filled("dot", &[&[1]], || Block::Normal))
    }
}
