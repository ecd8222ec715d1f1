//! Blocklands - rules engine for an 8x8 block-placement puzzle
//!
//! Pieces from a three-slot hand are placed on the board, full rows and
//! columns clear, and the cleared blocks feed level goals, boss damage and
//! combos. `GameSession` ties it all together.

pub mod board;
pub mod boss;
pub mod bot;
pub mod combo;
pub mod error;
pub mod game;
pub mod generator;
pub mod goals;
pub mod hand;
pub mod level;
pub mod piece;
pub mod powers;
pub mod score;
pub mod settings;
pub mod shapes;

pub use board::{BOARD_SIZE, Block, Board, Cell};
pub use error::{Error, Result};
pub use game::{GameSession, MoveReport, Outcome, SessionState, Snapshot};
pub use level::{GameMode, LevelConfig, LevelKind};
pub use piece::Piece;
pub use settings::{Progress, Rules, Settings};
