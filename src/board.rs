//! Game board representation, placement validation and line clearing

use crate::piece::Piece;
use serde::{Deserialize, Serialize};

/// The board is always 8x8
pub const BOARD_SIZE: usize = 8;

/// What a filled cell holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Plain filler block
    Normal,
    /// Collectible counted toward goals, optionally hurting an active boss
    Item {
        key: String,
        #[serde(default)]
        damage: Option<u32>,
    },
    /// Inert block dropped by bosses or level setup
    Obstacle { key: String },
    /// Permanent hazard (lava); fills lines but never leaves the board
    Terrain { key: String },
}

impl Block {
    pub fn item(key: &str) -> Self {
        Block::Item {
            key: key.to_string(),
            damage: None,
        }
    }

    pub fn item_with_damage(key: &str, damage: u32) -> Self {
        Block::Item {
            key: key.to_string(),
            damage: Some(damage),
        }
    }

    pub fn obstacle(key: &str) -> Self {
        Block::Obstacle {
            key: key.to_string(),
        }
    }

    pub fn lava() -> Self {
        Block::Terrain {
            key: "volcano".to_string(),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Block::Normal => None,
            Block::Item { key, .. } | Block::Obstacle { key } | Block::Terrain { key } => Some(key),
        }
    }

    pub fn is_terrain(&self) -> bool {
        matches!(self, Block::Terrain { .. })
    }
}

/// A cell on the board - either empty or holding a block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Block),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Cell::Empty => None,
            Cell::Filled(block) => Some(block),
        }
    }
}

/// A cell removed from the board, with what it held
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearedCell {
    pub row: usize,
    pub col: usize,
    pub block: Block,
}

/// Result of one clearing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineClear {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    /// Row cells first, then column cells not already taken by a row.
    /// Terrain stays on the board and is never listed here.
    pub cells: Vec<ClearedCell>,
}

impl LineClear {
    /// Rows and columns both count, so a cross clear is two lines
    pub fn lines(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }
}

/// Lines a placement would complete, without touching the board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinePreview {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

/// The game board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is the top
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<&Cell> {
        let (row, col) = Self::index(row, col)?;
        Some(&self.cells[row][col])
    }

    /// Set a cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match Self::index(row, col) {
            Some((row, col)) => {
                self.cells[row][col] = cell;
                true
            }
            None => false,
        }
    }

    fn index(row: i32, col: i32) -> Option<(usize, usize)> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return None;
        }
        Some((row, col))
    }

    /// Check if a position is within bounds and empty
    pub fn is_valid_position(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(Cell::is_empty)
    }

    /// Whether every filled cell of `piece` anchored at (row, col) lands
    /// on an empty in-bounds cell. Ghost previews and commits both go
    /// through here.
    pub fn can_place(&self, row: i32, col: i32, piece: &Piece) -> bool {
        piece
            .filled_offsets()
            .all(|(dr, dc)| self.is_valid_position(row + dr, col + dc))
    }

    /// Write the piece's blocks into the board. All or nothing.
    pub fn place(&mut self, row: i32, col: i32, piece: &Piece) -> bool {
        if !self.can_place(row, col, piece) {
            return false;
        }
        for (dr, dc, block) in piece.blocks() {
            self.set(row + dr, col + dc, Cell::Filled(block.clone()));
        }
        true
    }

    /// Whether any piece anchor on the board is legal
    pub fn fits_anywhere(&self, piece: &Piece) -> bool {
        (0..BOARD_SIZE as i32)
            .any(|row| (0..BOARD_SIZE as i32).any(|col| self.can_place(row, col, piece)))
    }

    /// A line is full when every cell is occupied and at least one of
    /// them can actually be cleared
    fn is_line_full<'a>(mut line: impl Iterator<Item = &'a Cell>) -> bool {
        let mut clearable = false;
        let all_filled = line.all(|cell| match cell {
            Cell::Empty => false,
            Cell::Filled(block) => {
                clearable |= !block.is_terrain();
                true
            }
        });
        all_filled && clearable
    }

    fn is_row_full(&self, row: usize) -> bool {
        Self::is_line_full(self.cells[row].iter())
    }

    fn is_col_full(&self, col: usize) -> bool {
        Self::is_line_full(self.cells.iter().map(|row| &row[col]))
    }

    pub fn full_rows(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&row| self.is_row_full(row)).collect()
    }

    pub fn full_cols(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&col| self.is_col_full(col)).collect()
    }

    /// Clear every full row and column found in a single scan.
    /// Rows and columns are detected before anything is removed, so a
    /// cross clear resolves together and never cascades.
    pub fn resolve_clears(&mut self) -> LineClear {
        let rows = self.full_rows();
        let cols = self.full_cols();
        let mut cells = Vec::new();

        for &row in &rows {
            for col in 0..BOARD_SIZE {
                if let Some(block) = self.take(row, col) {
                    cells.push(ClearedCell { row, col, block });
                }
            }
        }
        for &col in &cols {
            for row in 0..BOARD_SIZE {
                if let Some(block) = self.take(row, col) {
                    cells.push(ClearedCell { row, col, block });
                }
            }
        }

        LineClear { rows, cols, cells }
    }

    /// Simulate a placement on a scratch copy and report which lines
    /// would clear. None when the placement itself is illegal.
    pub fn predict_clears(&self, row: i32, col: i32, piece: &Piece) -> Option<LinePreview> {
        let mut scratch = self.clone();
        if !scratch.place(row, col, piece) {
            return None;
        }
        Some(LinePreview {
            rows: scratch.full_rows(),
            cols: scratch.full_cols(),
        })
    }

    /// Remove and return a clearable block. Terrain and empty cells
    /// yield None and stay as they are.
    pub fn take(&mut self, row: usize, col: usize) -> Option<Block> {
        let cell = self.cells.get_mut(row)?.get_mut(col)?;
        if !matches!(cell, Cell::Filled(block) if !block.is_terrain()) {
            return None;
        }
        match std::mem::take(cell) {
            Cell::Filled(block) => Some(block),
            Cell::Empty => None,
        }
    }

    /// Replace every block matching `pred` with `with`, returning how many changed
    pub fn transform_where(&mut self, pred: impl Fn(&Block) -> bool, with: &Block) -> usize {
        let mut changed = 0;
        for cell in self.cells.iter_mut().flatten() {
            if cell.block().is_some_and(&pred) {
                *cell = Cell::Filled(with.clone());
                changed += 1;
            }
        }
        changed
    }

    /// Coordinates of every empty cell, row-major
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut empty = Vec::new();
        for (row, line) in self.cells.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                if cell.is_empty() {
                    empty.push((row, col));
                }
            }
        }
        empty
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Iterate over rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_SIZE]> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_4h() -> Piece {
        Piece::filled("line-4h", &[&[1, 1, 1, 1]], || Block::Normal)
    }

    fn fill_row(board: &mut Board, row: i32, block: Block) {
        for col in 0..BOARD_SIZE as i32 {
            board.set(row, col, Cell::Filled(block.clone()));
        }
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.empty_cells().len(), BOARD_SIZE * BOARD_SIZE);
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::new();
        assert!(board.set(5, 5, Cell::Filled(Block::Normal)));
        assert_eq!(board.get(5, 5), Some(&Cell::Filled(Block::Normal)));
    }

    #[test]
    fn test_out_of_bounds() {
        let board = Board::new();
        assert_eq!(board.get(-1, 0), None);
        assert_eq!(board.get(0, -1), None);
        assert_eq!(board.get(BOARD_SIZE as i32, 0), None);
        assert_eq!(board.get(0, BOARD_SIZE as i32), None);
    }

    #[test]
    fn test_can_place_rejects_overhang_and_overlap() {
        let mut board = Board::new();
        let piece = line_4h();
        assert!(board.can_place(0, 4, &piece));
        assert!(!board.can_place(0, 5, &piece));
        assert!(!board.can_place(-1, 0, &piece));

        board.set(3, 2, Cell::Filled(Block::Normal));
        assert!(!board.can_place(3, 0, &piece));
        assert!(board.can_place(3, 3, &piece));
    }

    #[test]
    fn test_holes_in_shape_do_not_collide() {
        let mut board = Board::new();
        board.set(0, 1, Cell::Filled(Block::Normal));
        // corner-tl: [[1,0],[1,1]] leaves (0,1) untouched
        let corner = Piece::filled("corner-tl", &[&[1, 0], &[1, 1]], || Block::Normal);
        assert!(board.can_place(0, 0, &corner));
        assert!(board.place(0, 0, &corner));
        assert_eq!(board.get(0, 1), Some(&Cell::Filled(Block::Normal)));
    }

    #[test]
    fn test_failed_place_leaves_board_untouched() {
        let mut board = Board::new();
        board.set(0, 3, Cell::Filled(Block::item("bee")));
        let before = board.clone();
        assert!(!board.place(0, 0, &line_4h()));
        assert_eq!(board, before);
    }

    #[test]
    fn test_clear_single_row() {
        let mut board = Board::new();
        assert!(board.place(0, 0, &line_4h()));
        assert!(board.place(0, 4, &line_4h()));
        board.set(1, 0, Cell::Filled(Block::Normal));

        let cleared = board.resolve_clears();
        assert_eq!(cleared.rows, vec![0]);
        assert!(cleared.cols.is_empty());
        assert_eq!(cleared.cells.len(), BOARD_SIZE);
        assert!(board.rows().next().is_some_and(|row| row.iter().all(Cell::is_empty)));
        // Nothing falls in this game
        assert!(board.get(1, 0).is_some_and(Cell::is_filled));
    }

    #[test]
    fn test_cross_clear_counts_both_lines_once_per_cell() {
        let mut board = Board::new();
        fill_row(&mut board, 2, Block::Normal);
        for row in 0..BOARD_SIZE as i32 {
            board.set(row, 5, Cell::Filled(Block::item("bee")));
        }

        let cleared = board.resolve_clears();
        assert_eq!(cleared.rows, vec![2]);
        assert_eq!(cleared.cols, vec![5]);
        assert_eq!(cleared.lines(), 2);
        assert_eq!(cleared.cells.len(), 15);
        assert!(board.is_empty());
    }

    #[test]
    fn test_resolve_twice_finds_nothing() {
        let mut board = Board::new();
        fill_row(&mut board, 7, Block::Normal);
        assert_eq!(board.resolve_clears().lines(), 1);
        assert!(board.resolve_clears().is_empty());
    }

    #[test]
    fn test_terrain_fills_lines_but_stays() {
        let mut board = Board::new();
        board.set(4, 0, Cell::Filled(Block::lava()));
        for col in 1..BOARD_SIZE as i32 {
            board.set(4, col, Cell::Filled(Block::Normal));
        }

        let cleared = board.resolve_clears();
        assert_eq!(cleared.rows, vec![4]);
        assert_eq!(cleared.cells.len(), BOARD_SIZE - 1);
        assert_eq!(board.get(4, 0), Some(&Cell::Filled(Block::lava())));
        assert!(board.resolve_clears().is_empty());
    }

    #[test]
    fn test_all_terrain_line_is_not_full() {
        let mut board = Board::new();
        fill_row(&mut board, 0, Block::lava());
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn test_predict_matches_commit_and_does_not_mutate() {
        let mut board = Board::new();
        assert!(board.place(0, 0, &line_4h()));
        let before = board.clone();

        let preview = board.predict_clears(0, 4, &line_4h());
        assert_eq!(
            preview,
            Some(LinePreview {
                rows: vec![0],
                cols: vec![]
            })
        );
        assert_eq!(board, before);
        assert_eq!(board.predict_clears(0, 2, &line_4h()), None);

        for row in -2..BOARD_SIZE as i32 + 2 {
            for col in -2..BOARD_SIZE as i32 + 2 {
                assert_eq!(
                    board.can_place(row, col, &line_4h()),
                    board.predict_clears(row, col, &line_4h()).is_some()
                );
            }
        }
    }

    #[test]
    fn test_take_and_transform() {
        let mut board = Board::new();
        board.set(1, 1, Cell::Filled(Block::item("fire")));
        board.set(2, 2, Cell::Filled(Block::item("fire")));
        board.set(3, 3, Cell::Filled(Block::lava()));

        assert_eq!(board.take(3, 3), None);
        assert_eq!(
            board.transform_where(|b| b.key() == Some("fire"), &Block::obstacle("stone")),
            2
        );
        assert_eq!(board.take(1, 1), Some(Block::obstacle("stone")));
        assert!(board.get(1, 1).is_some_and(Cell::is_empty));
    }
}
