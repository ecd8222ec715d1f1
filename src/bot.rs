//! Autoplay strategies for the headless shell

use crate::board::BOARD_SIZE;
use crate::game::GameSession;

/// A placement chosen by a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub slot: usize,
    pub row: i32,
    pub col: i32,
}

/// A strategy picks the next placement for a session, or None when no
/// piece fits anywhere
pub trait Strategy {
    fn choose(&self, session: &GameSession) -> Option<Placement>;
}

/// Takes the first legal anchor of the first piece that fits
pub struct FirstFit;

impl Strategy for FirstFit {
    fn choose(&self, session: &GameSession) -> Option<Placement> {
        candidates(session).next().map(|(placement, _)| placement)
    }
}

/// Prefers the placement that clears the most lines, then the one that
/// fills the most cells, then the top-left-most anchor
pub struct GreedyBot;

impl Strategy for GreedyBot {
    fn choose(&self, session: &GameSession) -> Option<Placement> {
        let mut best: Option<(Placement, (usize, usize))> = None;
        for (placement, score) in candidates(session) {
            if best.as_ref().is_none_or(|(_, top)| score > *top) {
                best = Some((placement, score));
            }
        }
        best.map(|(placement, _)| placement)
    }
}

/// Every legal placement with its (lines cleared, cells filled) rating,
/// using the same prediction path as the ghost preview
fn candidates(session: &GameSession) -> impl Iterator<Item = (Placement, (usize, usize))> + '_ {
    session.hand().live().flat_map(move |(slot, piece)| {
        let anchors = (0..BOARD_SIZE as i32)
            .flat_map(|row| (0..BOARD_SIZE as i32).map(move |col| (row, col)));
        anchors.filter_map(move |(row, col)| {
            let preview = session.preview(slot, row, col)?;
            let lines = preview.rows.len() + preview.cols.len();
            Some((Placement { slot, row, col }, (lines, piece.cell_count())))
        })
    })
}
