//! The three-slot hand of pieces waiting to be placed

use crate::generator::{ItemPool, PieceSource};
use crate::piece::Piece;
use serde::Serialize;

pub const HAND_SIZE: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hand {
    slots: [Option<Piece>; HAND_SIZE],
}

impl Hand {
    /// Deal a full hand
    pub fn deal(source: &mut dyn PieceSource, pool: &ItemPool, weighted: bool) -> Self {
        Self {
            slots: std::array::from_fn(|_| Some(source.next_piece(pool, weighted))),
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Piece> {
        self.slots.get(slot)?.as_ref()
    }

    /// Remove the piece from a slot, leaving it empty
    pub fn take(&mut self, slot: usize) -> Option<Piece> {
        self.slots.get_mut(slot)?.take()
    }

    /// Put a piece into a slot that currently holds one
    pub fn replace(&mut self, slot: usize, piece: Piece) -> Option<Piece> {
        let current = self.slots.get_mut(slot)?;
        if current.is_none() {
            return None;
        }
        current.replace(piece)
    }

    /// Live pieces with their slot index
    pub fn live(&self) -> impl Iterator<Item = (usize, &Piece)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, piece)| piece.as_ref().map(|piece| (slot, piece)))
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    /// All slots used up
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
