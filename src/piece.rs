//! Pieces held in the hand: a shape matrix plus the block in each filled cell

use crate::board::Block;
use serde::Serialize;

/// A polyomino with its per-cell contents.
/// `layout[r][c]` is Some exactly where the shape matrix is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub name: &'static str,
    layout: Vec<Vec<Option<Block>>>,
}

impl Piece {
    /// Build a piece from its layout. Rows shorter than the widest one
    /// are padded with holes so the matrix stays rectangular.
    pub fn new(name: &'static str, mut layout: Vec<Vec<Option<Block>>>) -> Self {
        let width = layout.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut layout {
            row.resize(width, None);
        }
        Self { name, layout }
    }

    /// Build a piece from a 0/1 matrix, asking `fill` for each set cell
    /// in row-major order
    pub fn filled(name: &'static str, matrix: &[&[u8]], mut fill: impl FnMut() -> Block) -> Self {
        let layout = matrix
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&bit| if bit != 0 { Some(fill()) } else { None })
                    .collect()
            })
            .collect();
        Self::new(name, layout)
    }

    pub fn rows(&self) -> usize {
        self.layout.len()
    }

    pub fn cols(&self) -> usize {
        self.layout.first().map_or(0, Vec::len)
    }

    /// The boolean shape matrix
    pub fn shape(&self) -> Vec<Vec<bool>> {
        self.layout
            .iter()
            .map(|row| row.iter().map(Option::is_some).collect())
            .collect()
    }

    /// Offsets (row, col) of every filled cell relative to the anchor
    pub fn filled_offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.blocks().map(|(dr, dc, _)| (dr, dc))
    }

    /// Filled cells with their blocks
    pub fn blocks(&self) -> impl Iterator<Item = (i32, i32, &Block)> + '_ {
        self.layout.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.as_ref().map(|block| (r as i32, c as i32, block)))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.filled_offsets().count()
    }

    /// Rotate 90 degrees clockwise, carrying blocks along.
    /// Returns None when the rotation would not change the piece.
    pub fn rotated_cw(&self) -> Option<Piece> {
        let (rows, cols) = (self.rows(), self.cols());
        let layout: Vec<Vec<Option<Block>>> = (0..cols)
            .map(|c| (0..rows).rev().map(|r| self.layout[r][c].clone()).collect())
            .collect();
        let rotated = Piece {
            name: self.name,
            layout,
        };
        (rotated != *self).then_some(rotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_skip_holes() {
        let piece = Piece::filled("t-0", &[&[1, 1, 1], &[0, 1, 0]], || Block::Normal);
        let offsets: Vec<_> = piece.filled_offsets().collect();
        assert_eq!(offsets, vec![(0, 0), (0, 1), (0, 2), (1, 1)]);
        assert_eq!(piece.rows(), 2);
        assert_eq!(piece.cols(), 3);
        assert_eq!(piece.cell_count(), 4);
    }

    #[test]
    fn test_shape_matches_layout() {
        let piece = Piece::filled("corner-br", &[&[1, 1], &[0, 1]], || Block::item("bee"));
        assert_eq!(piece.shape(), vec![vec![true, true], vec![false, true]]);
    }

    #[test]
    fn test_ragged_layout_is_padded() {
        let piece = Piece::new(
            "ragged",
            vec![vec![Some(Block::Normal)], vec![None, Some(Block::Normal)]],
        );
        assert_eq!(piece.cols(), 2);
        assert_eq!(piece.shape()[0], vec![true, false]);
    }

    #[test]
    fn test_rotation_moves_blocks() {
        let mut n = 0;
        let piece = Piece::filled("line-3h", &[&[1, 1, 1]], || {
            n += 1;
            Block::item(if n == 1 { "fire" } else { "heart" })
        });
        let rotated = piece.rotated_cw().expect("line rotates");
        assert_eq!(rotated.rows(), 3);
        assert_eq!(rotated.cols(), 1);
        let first = rotated.blocks().next().map(|(_, _, b)| b.clone());
        assert_eq!(first, Some(Block::item("fire")));
    }

    #[test]
    fn test_symmetric_rotation_is_none() {
        let square = Piece::filled("square-2x2", &[&[1, 1], &[1, 1]], || Block::Normal);
        assert!(square.rotated_cw().is_none());
        let dot = Piece::filled("dot", &[&[1]], || Block::Normal);
        assert!(dot.rotated_cw().is_none());
    }
}
