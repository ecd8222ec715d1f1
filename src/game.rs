//! Core game session: one board, one hand, and everything a move touches
//!
//! Every operation runs the whole pipeline synchronously. A placement is
//! validated, committed, cleared, scored, collected, answered by the boss
//! and finally checked for victory and for remaining legal moves. Rejected
//! operations return `None` and leave the session exactly as it was.

use crate::board::{Block, Board, Cell, ClearedCell, LineClear, LinePreview};
use crate::boss::{BossEvent, BossId, BossState};
use crate::combo::{ComboTracker, Hero, HeroGate, HeroRoster};
use crate::generator::{ItemPool, PieceSource, RandomPieces};
use crate::goals::{GoalLedger, GoalProgress, GoalVerdict, VictoryRule};
use crate::hand::Hand;
use crate::level::{GameMode, LevelConfig, LevelKind};
use crate::powers::{self, Inventory, PendingSecondPhase, PowerUp};
use crate::score::Score;
use crate::settings::Rules;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Playing,
    /// Half of the X slash has landed; only `advance_second_phase` is accepted
    AwaitingSecondPhase,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VictoryReport {
    pub score: u64,
    pub collected: BTreeMap<String, u32>,
    /// Reward room prize, for the progress store to grant
    pub rewards: Vec<String>,
    /// Adventure level to unlock
    pub next_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefeatReport {
    pub score: u64,
    pub collected: BTreeMap<String, u32>,
    /// HP the boss had left, if one was fought
    pub boss_hp: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Continue,
    Victory(VictoryReport),
    Defeat(DefeatReport),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}

/// Everything one accepted operation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    /// Lines cleared by a placement, or the cells struck by an ability
    pub cleared: LineClear,
    pub score_gained: u64,
    pub combo: u32,
    /// Boss HP actually removed
    pub damage_dealt: u32,
    pub boss_events: Vec<BossEvent>,
    /// Heroes armed by this move's combo
    pub unlocked_heroes: Vec<Hero>,
    /// A fresh hand was dealt
    pub new_hand: bool,
    pub pending: Option<PendingSecondPhase>,
    pub outcome: Outcome,
}

impl MoveReport {
    fn new(cleared: LineClear) -> Self {
        Self {
            cleared,
            score_gained: 0,
            combo: 0,
            damage_dealt: 0,
            boss_events: Vec::new(),
            unlocked_heroes: Vec::new(),
            new_hand: false,
            pending: None,
            outcome: Outcome::Continue,
        }
    }
}

/// Read-only view of the session for a presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub mode: GameMode,
    pub level: u32,
    pub state: SessionState,
    pub board: Board,
    pub hand: Hand,
    pub score: Score,
    pub combo: u32,
    pub goals: Vec<GoalProgress>,
    pub boss: Option<BossState>,
    pub heroes: Vec<HeroGate>,
    pub inventory: Inventory,
    pub pending: Option<PendingSecondPhase>,
    pub moves: u32,
}

/// The main session struct
pub struct GameSession {
    mode: GameMode,
    level: LevelConfig,
    rules: Rules,
    pool: ItemPool,
    /// Use pool weights when filling pieces
    weighted_stats: bool,
    board: Board,
    hand: Hand,
    score: Score,
    combo: ComboTracker,
    goals: GoalLedger,
    boss: BossState,
    heroes: HeroRoster,
    /// Power-ups brought into the session
    inventory: Inventory,
    state: SessionState,
    pending: Option<PendingSecondPhase>,
    outcome: Outcome,
    source: Box<dyn PieceSource>,
    /// Drives boss hooks
    rng: ChaCha8Rng,
    /// Accepted moves since the last (re)start
    moves: u32,
}

impl GameSession {
    /// Casual board with default rules
    pub fn casual(rules: Rules, seed: u64) -> Self {
        Self::with_seed(GameMode::Casual, LevelConfig::casual(), rules, Inventory::default(), seed)
    }

    /// Create a session with a random seed
    pub fn new(mode: GameMode, level: LevelConfig, rules: Rules, inventory: Inventory) -> Self {
        Self::with_seed(mode, level, rules, inventory, rand::random())
    }

    /// Same seed, same pieces and boss rolls
    pub fn with_seed(
        mode: GameMode,
        level: LevelConfig,
        rules: Rules,
        inventory: Inventory,
        seed: u64,
    ) -> Self {
        Self::with_source(
            mode,
            level,
            rules,
            inventory,
            Box::new(RandomPieces::with_seed(seed)),
            seed,
        )
    }

    /// Create a session dealing from any piece source
    pub fn with_source(
        mode: GameMode,
        level: LevelConfig,
        rules: Rules,
        mut inventory: Inventory,
        source: Box<dyn PieceSource>,
        seed: u64,
    ) -> Self {
        let pool = level.item_pool();
        inventory.cap = rules.inventory_cap;
        let goals = GoalLedger::new(level.resolved_goals(&rules));
        let boss = match &level.boss {
            Some(config) if level.kind == LevelKind::Boss => {
                if config.id == BossId::Unknown {
                    tracing::warn!("Unknown boss id on level {}, it will not act", level.id);
                }
                BossState::new(config, rules.attack_rate)
            }
            _ => BossState::inactive(),
        };
        let mut session = Self {
            mode,
            pool,
            weighted_stats: true,
            board: Board::new(),
            hand: Hand::default(),
            score: Score::new(),
            combo: ComboTracker::new(rules.combo_window_ms),
            goals,
            boss,
            heroes: HeroRoster::new(&rules.heroes),
            inventory,
            state: SessionState::Playing,
            pending: None,
            outcome: Outcome::Continue,
            source,
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            moves: 0,
            level,
            rules,
        };
        session.reset();
        tracing::info!(
            "Session started: mode={}, level={}, goals={:?}",
            session.mode.name(),
            session.level.display_name(),
            session.goals.targets()
        );
        session
    }

    /// Start the level over. Power-ups already spent stay spent.
    pub fn restart(&mut self) {
        tracing::info!("Restarting {}", self.level.display_name());
        self.combo.reset();
        self.goals.reset();
        self.boss.reset();
        self.reset();
    }

    /// Lay out the board and deal a fresh hand. Combo, goals and boss are
    /// reset by the caller.
    fn reset(&mut self) {
        self.board = Board::new();
        for tile in &self.level.grid {
            if !self.board.set(tile.row as i32, tile.col as i32, Cell::Filled(tile.block.clone())) {
                tracing::warn!("Overlay tile ({}, {}) is off the board", tile.row, tile.col);
            }
        }
        self.score = Score::new();
        self.heroes = HeroRoster::new(&self.rules.heroes);
        self.state = SessionState::Playing;
        self.pending = None;
        self.outcome = Outcome::Continue;
        self.moves = 0;
        self.hand = Hand::deal(self.source.as_mut(), &self.pool, self.weighted_stats);
        self.check_availability();
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn goals(&self) -> &GoalLedger {
        &self.goals
    }

    pub fn boss(&self) -> &BossState {
        &self.boss
    }

    pub fn heroes(&self) -> &HeroRoster {
        &self.heroes
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingSecondPhase> {
        self.pending.as_ref()
    }

    /// Latest outcome; terminal once the session is won or lost
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Fill pieces with equal odds per pool entry instead of by weight
    pub fn set_weighted_stats(&mut self, weighted: bool) {
        self.weighted_stats = weighted;
    }

    fn victory_rule(&self) -> VictoryRule {
        self.level.kind.victory_rule()
    }

    /// Whether the piece in `slot` may be anchored at (row, col)
    pub fn can_place(&self, slot: usize, row: i32, col: i32) -> bool {
        self.hand
            .get(slot)
            .is_some_and(|piece| self.board.can_place(row, col, piece))
    }

    /// Lines the piece in `slot` would clear at (row, col). None when the
    /// placement is illegal.
    pub fn preview(&self, slot: usize, row: i32, col: i32) -> Option<LinePreview> {
        let piece = self.hand.get(slot)?;
        self.board.predict_clears(row, col, piece)
    }

    /// Whether any live piece fits anywhere on the board
    pub fn has_any_legal_move(&self) -> bool {
        self.hand.live().any(|(_, piece)| self.board.fits_anywhere(piece))
    }

    fn accepting_moves(&self, action: &str) -> bool {
        if self.state != SessionState::Playing {
            tracing::debug!("Rejected {}: session is {:?}", action, self.state);
            return false;
        }
        true
    }

    /// Place the piece in `slot` with its top-left cell at (row, col)
    pub fn place(&mut self, slot: usize, row: i32, col: i32, now_ms: u64) -> Option<MoveReport> {
        if !self.accepting_moves("placement") {
            return None;
        }
        let piece = self.hand.get(slot)?;
        if !self.board.place(row, col, piece) {
            tracing::debug!("Rejected placement of slot {} at ({}, {})", slot, row, col);
            return None;
        }
        self.hand.take(slot);
        self.moves += 1;

        let cleared = self.board.resolve_clears();
        let lines = cleared.lines();
        let mut report = MoveReport::new(LineClear::default());
        if lines > 0 {
            let combo = self.combo.register_clear(now_ms, lines);
            report.score_gained =
                self.score
                    .add_clear(lines, self.combo.multiplier(), self.rules.points_per_line);
            if self.mode.has_heroes() {
                report.unlocked_heroes = self.heroes.rearm(combo);
                for hero in &report.unlocked_heroes {
                    tracing::debug!("Hero {} is ready", hero.name());
                }
            }
            tracing::debug!(
                "Cleared rows {:?} cols {:?}, combo {}, +{}",
                cleared.rows,
                cleared.cols,
                combo,
                report.score_gained
            );
        }
        report.combo = self.combo.count();
        report.damage_dealt = self.collect(&cleared.cells);
        report.cleared = cleared;

        let damaging = report.damage_dealt > 0;
        self.finish_move(&mut report, damaging);
        Some(report)
    }

    /// Count cleared cells toward goals and boss damage, returning the HP removed
    fn collect(&mut self, cells: &[ClearedCell]) -> u32 {
        let hp_before = self.boss.current_hp;
        for cell in cells {
            self.goals.collect(&cell.block);
            if let Block::Item { damage, .. } = &cell.block {
                let amount = damage.unwrap_or(self.rules.default_item_damage);
                if self.boss.damage(amount) {
                    tracing::info!("{} defeated", self.boss.id.name());
                }
            }
        }
        hp_before - self.boss.current_hp
    }

    /// Boss turn, victory check, redeal and availability check
    fn finish_move(&mut self, report: &mut MoveReport, damaging: bool) {
        if self.boss.is_active() {
            report.boss_events =
                self.boss
                    .end_turn(damaging, &mut self.board, &mut self.rng, &self.rules.boss);
            for event in &report.boss_events {
                tracing::debug!("{}: {:?}", self.boss.id.name(), event);
            }
        }

        if self.check_victory() {
            report.outcome = self.outcome.clone();
            return;
        }

        if self.hand.is_empty() {
            self.hand = Hand::deal(self.source.as_mut(), &self.pool, self.weighted_stats);
            report.new_hand = true;
        }
        if self.state == SessionState::Playing && !self.has_any_legal_move() {
            self.defeat();
        }
        report.outcome = self.outcome.clone();
    }

    fn check_victory(&mut self) -> bool {
        if self.boss.is_defeated() {
            self.victory(None);
            return true;
        }
        if self.level.kind == LevelKind::Boss && self.boss.is_active() {
            return false;
        }
        match self.goals.verdict(self.victory_rule(), &self.inventory) {
            GoalVerdict::Pending => false,
            GoalVerdict::Complete => {
                self.victory(None);
                true
            }
            GoalVerdict::Reward(key) => {
                self.victory(Some(key));
                true
            }
        }
    }

    fn victory(&mut self, reward: Option<String>) {
        let next_level = (self.mode == GameMode::Adventure && self.level.kind != LevelKind::Bonus)
            .then_some(self.level.id + 1);
        tracing::info!(
            "Victory on {}: score {}, reward {:?}",
            self.level.display_name(),
            self.score.points,
            reward
        );
        self.state = SessionState::Won;
        self.pending = None;
        self.outcome = Outcome::Victory(VictoryReport {
            score: self.score.points,
            collected: self.goals.collected_counts().clone(),
            rewards: reward.into_iter().collect(),
            next_level,
        });
    }

    fn defeat(&mut self) {
        tracing::info!(
            "No legal move left on {}: score {}",
            self.level.display_name(),
            self.score.points
        );
        self.state = SessionState::Lost;
        self.outcome = Outcome::Defeat(DefeatReport {
            score: self.score.points,
            collected: self.goals.collected_counts().clone(),
            boss_hp: self.boss.is_active().then_some(self.boss.current_hp),
        });
    }

    /// Apply struck cells as a move of their own
    fn strike(&mut self, cells: &[(usize, usize)]) -> MoveReport {
        let struck = powers::strike(&mut self.board, cells);
        let mut report = MoveReport::new(LineClear::default());
        report.damage_dealt = self.collect(&struck);
        report.combo = self.combo.count();
        report.cleared.cells = struck;
        report
    }

    /// Clear the 3x3 square around (row, col), paid with one bomb
    pub fn use_bomb(&mut self, row: i32, col: i32) -> Option<MoveReport> {
        if !self.accepting_moves("bomb") {
            return None;
        }
        let key = PowerUp::Bomb.key();
        let area = powers::bomb_area(row, col);
        if self.inventory.count(key) == 0 || !powers::has_targets(&self.board, &area) {
            tracing::debug!("Rejected bomb at ({}, {})", row, col);
            return None;
        }
        self.inventory.consume(key);
        self.moves += 1;
        let mut report = self.strike(&area);
        self.finish_move(&mut report, true);
        Some(report)
    }

    /// Rotate the piece in `slot` clockwise, paid with one rotate
    pub fn use_rotate(&mut self, slot: usize) -> bool {
        if !self.accepting_moves("rotate") {
            return false;
        }
        let key = PowerUp::Rotate.key();
        if self.inventory.count(key) == 0 {
            return false;
        }
        let Some(rotated) = self.hand.get(slot).and_then(|piece| piece.rotated_cw()) else {
            tracing::debug!("Rejected rotate of slot {}", slot);
            return false;
        };
        self.inventory.consume(key);
        self.hand.replace(slot, rotated);
        self.check_availability();
        true
    }

    /// Exchange the piece in `slot` for a fresh one, paid with one swap
    pub fn use_swap(&mut self, slot: usize) -> bool {
        if !self.accepting_moves("swap") {
            return false;
        }
        let key = PowerUp::Swap.key();
        if self.inventory.count(key) == 0 || self.hand.get(slot).is_none() {
            tracing::debug!("Rejected swap of slot {}", slot);
            return false;
        }
        self.inventory.consume(key);
        let piece = self.source.next_piece(&self.pool, self.weighted_stats);
        self.hand.replace(slot, piece);
        self.check_availability();
        true
    }

    /// A changed hand may leave nothing placeable
    fn check_availability(&mut self) {
        if !self.has_any_legal_move() {
            self.defeat();
        }
    }

    /// Summon an armed hero onto (row, col). The player's X slash lands
    /// its second half only when `advance_second_phase` is called.
    pub fn use_hero(&mut self, hero: Hero, row: i32, col: i32, now_ms: u64) -> Option<MoveReport> {
        if !self.accepting_moves("hero") {
            return None;
        }
        if !self.mode.has_heroes() || !self.heroes.is_unlocked(hero) {
            tracing::debug!("Rejected {}: not armed", hero.name());
            return None;
        }
        let (first, second) = match hero {
            Hero::Thalion => (powers::horizontal_strike(row, col), Vec::new()),
            Hero::Nyx => (powers::column_strike(row, col), Vec::new()),
            Hero::Player => powers::x_slash(row, col),
        };
        if !powers::has_targets(&self.board, &first) && !powers::has_targets(&self.board, &second) {
            tracing::debug!("Rejected {} at ({}, {}): nothing to hit", hero.name(), row, col);
            return None;
        }
        self.heroes.consume(hero);
        self.moves += 1;
        let mut report = self.strike(&first);

        if second.is_empty() {
            self.finish_move(&mut report, true);
            return Some(report);
        }
        if self.check_victory() {
            report.outcome = self.outcome.clone();
            return Some(report);
        }
        let pending = PendingSecondPhase {
            hero,
            cells: second,
            due_ms: now_ms.saturating_add(self.rules.second_phase_delay_ms),
        };
        self.state = SessionState::AwaitingSecondPhase;
        self.pending = Some(pending.clone());
        report.pending = Some(pending);
        Some(report)
    }

    /// Land the second half of a pending X slash. Rejected before it is due.
    pub fn advance_second_phase(&mut self, now_ms: u64) -> Option<MoveReport> {
        if self.state != SessionState::AwaitingSecondPhase {
            return None;
        }
        if self.pending.as_ref().is_none_or(|pending| now_ms < pending.due_ms) {
            return None;
        }
        let pending = self.pending.take()?;
        self.state = SessionState::Playing;
        let mut report = self.strike(&pending.cells);
        self.finish_move(&mut report, true);
        Some(report)
    }

    /// Current state for a presentation layer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            level: self.level.id,
            state: self.state,
            board: self.board.clone(),
            hand: self.hand.clone(),
            score: self.score.clone(),
            combo: self.combo.count(),
            goals: self.goals.progress(),
            boss: (self.level.kind == LevelKind::Boss).then(|| self.boss.clone()),
            heroes: self.heroes.gates().to_vec(),
            inventory: self.inventory.clone(),
            pending: self.pending.clone(),
            moves: self.moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::BossConfig;
    use crate::generator::{FixedPieces, ItemWeight};
    use crate::level::TileOverlay;
    use crate::piece::Piece;

    fn dot(block: Block) -> Piece {
        Piece::filled("dot", &[&[1]], move || block.clone())
    }

    fn line_4h() -> Piece {
        Piece::filled("line-4h", &[&[1, 1, 1, 1]], || Block::Normal)
    }

    fn normal_tiles(rows: &[usize], cols: std::ops::Range<usize>) -> Vec<TileOverlay> {
        rows.iter()
            .flat_map(|&row| {
                cols.clone().map(move |col| TileOverlay {
                    row,
                    col,
                    block: Block::Normal,
                })
            })
            .collect()
    }

    fn level(kind: LevelKind, grid: Vec<TileOverlay>) -> LevelConfig {
        LevelConfig {
            id: 3,
            name: None,
            kind,
            goals: [("fire".to_string(), 50)].into_iter().collect(),
            items: vec![ItemWeight::new("fire", 4)],
            grid,
            boss: None,
        }
    }

    fn session(
        mode: GameMode,
        level: LevelConfig,
        rules: Rules,
        pieces: Vec<Piece>,
    ) -> GameSession {
        GameSession::with_source(
            mode,
            level,
            rules,
            Inventory::default(),
            Box::new(FixedPieces::new(pieces)),
            1,
        )
    }

    #[test]
    fn test_two_bars_clear_a_row() {
        let mut game = GameSession::with_source(
            GameMode::Casual,
            LevelConfig::casual(),
            Rules::default(),
            Inventory::default(),
            Box::new(FixedPieces::new([line_4h(), line_4h(), line_4h()])),
            1,
        );
        let first = game.place(0, 0, 0, 0).expect("legal");
        assert!(first.cleared.is_empty());
        assert_eq!(game.preview(1, 0, 4).map(|p| p.rows), Some(vec![0]));

        let second = game.place(1, 0, 4, 100).expect("legal");
        assert_eq!(second.cleared.rows, vec![0]);
        assert_eq!(second.score_gained, 10);
        assert_eq!(second.combo, 1);
        assert!(game.board().is_empty());
        assert_eq!(second.outcome, Outcome::Continue);
    }

    #[test]
    fn test_rejected_placement_changes_nothing() {
        let mut game = session(
            GameMode::Adventure,
            level(LevelKind::Normal, normal_tiles(&[0], 3..4)),
            Rules::default(),
            vec![line_4h(), line_4h(), line_4h()],
        );
        let before = game.snapshot();
        assert!(!game.can_place(0, 0, 0));
        assert!(game.place(0, 0, 0, 0).is_none());
        assert!(game.place(0, 6, 6, 0).is_none());
        assert!(game.place(5, 1, 0, 0).is_none());
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_empty_hand_is_redealt() {
        let mut game = session(GameMode::Casual, LevelConfig::casual(), Rules::default(), vec![]);
        game.place(0, 0, 0, 0);
        game.place(1, 2, 2, 0);
        let report = game.place(2, 4, 4, 0).expect("legal");
        assert!(report.new_hand);
        assert_eq!(game.hand().len(), 3);
        assert_eq!(game.moves(), 3);
    }

    #[test]
    fn test_goals_complete_the_level() {
        let mut game = session(
            GameMode::Adventure,
            LevelConfig {
                goals: [("fire".to_string(), 1)].into_iter().collect(),
                ..level(LevelKind::Normal, normal_tiles(&[2], 1..8))
            },
            Rules::default(),
            vec![dot(Block::item("fire"))],
        );
        let report = game.place(0, 2, 0, 0).expect("legal");
        match report.outcome {
            Outcome::Victory(victory) => {
                assert_eq!(victory.next_level, Some(4));
                assert_eq!(victory.collected.get("fire"), Some(&1));
                assert!(victory.rewards.is_empty());
            }
            other => panic!("expected victory, got {:?}", other),
        }
        assert_eq!(game.state(), SessionState::Won);
        assert!(game.place(1, 5, 5, 0).is_none());
    }

    #[test]
    fn test_checkerboard_hand_with_no_fit_loses() {
        let grid: Vec<TileOverlay> = (0..8)
            .flat_map(|row| (0..8).map(move |col| (row, col)))
            .filter(|(row, col)| (row + col) % 2 == 0)
            .map(|(row, col)| TileOverlay {
                row,
                col,
                block: Block::obstacle("coal"),
            })
            .collect();
        let mini = || Piece::filled("mini-h", &[&[1, 1]], || Block::Normal);
        let mut game = session(
            GameMode::Adventure,
            level(LevelKind::Normal, grid),
            Rules::default(),
            vec![dot(Block::Normal), dot(Block::item("fire")), mini()],
        );
        assert_eq!(game.state(), SessionState::Playing);
        game.place(0, 0, 1, 0).expect("legal");
        let report = game.place(1, 0, 3, 0).expect("legal");
        match report.outcome {
            Outcome::Defeat(defeat) => {
                assert_eq!(defeat.score, 0);
                assert_eq!(defeat.collected.get("fire"), Some(&0));
                assert_eq!(defeat.boss_hp, None);
            }
            other => panic!("expected defeat, got {:?}", other),
        }
        assert!(game.place(2, 0, 5, 0).is_none());
    }

    #[test]
    fn test_dead_hand_at_start_loses_immediately() {
        let mut grid = normal_tiles(&[0, 2, 4, 6], 0..7);
        grid.extend(normal_tiles(&[1, 3, 5, 7], 1..8));
        let mini = || Piece::filled("mini-v", &[&[1], &[1]], || Block::Normal);
        let game = session(
            GameMode::Casual,
            level(LevelKind::Normal, grid),
            Rules::default(),
            vec![mini(), mini(), mini()],
        );
        assert_eq!(game.state(), SessionState::Lost);
        assert!(game.outcome().is_terminal());
    }

    fn boss_level(max_hp: u32, grid: Vec<TileOverlay>) -> LevelConfig {
        LevelConfig {
            goals: BTreeMap::new(),
            boss: Some(BossConfig {
                id: BossId::Pyra,
                max_hp,
                attack_rate: None,
            }),
            ..level(LevelKind::Boss, grid)
        }
    }

    #[test]
    fn test_boss_takes_damage_then_attacks() {
        let fire = || dot(Block::item_with_damage("fire", 5));
        let mut game = session(
            GameMode::Adventure,
            boss_level(50, normal_tiles(&[0, 1, 2], 1..8)),
            Rules::default(),
            vec![fire(), fire(), fire()],
        );
        for row in 0..3 {
            let report = game.place(row as usize, row, 0, 0).expect("legal");
            assert_eq!(report.damage_dealt, 5);
        }
        assert_eq!(game.boss().current_hp, 35);

        let quiet = [(5, 0), (5, 2), (5, 4)];
        let mut events = Vec::new();
        for (slot, (row, col)) in quiet.into_iter().enumerate() {
            let report = game.place(slot, row, col, 0).expect("legal");
            assert_eq!(report.damage_dealt, 0);
            events.push(report.boss_events);
        }
        assert!(!events[0].contains(&BossEvent::Attacked));
        assert!(!events[1].contains(&BossEvent::Attacked));
        assert!(events[2].contains(&BossEvent::Attacked));
    }

    #[test]
    fn test_killing_the_boss_wins() {
        let mut game = session(
            GameMode::Adventure,
            boss_level(4, normal_tiles(&[0], 1..8)),
            Rules::default(),
            vec![dot(Block::item_with_damage("fire", 9))],
        );
        let report = game.place(0, 0, 0, 0).expect("legal");
        assert_eq!(report.damage_dealt, 4);
        assert!(report.boss_events.is_empty());
        assert!(matches!(report.outcome, Outcome::Victory(_)));
        assert!(game.boss().is_defeated());
    }

    #[test]
    fn test_items_without_damage_use_default() {
        let mut game = session(
            GameMode::Adventure,
            boss_level(10, normal_tiles(&[0], 1..8)),
            Rules::default(),
            vec![dot(Block::item("heart"))],
        );
        let report = game.place(0, 0, 0, 0).expect("legal");
        assert_eq!(report.damage_dealt, 1);
        assert_eq!(game.boss().current_hp, 9);
    }

    #[test]
    fn test_combo_arms_and_rearms_thalion() {
        let mut grid = normal_tiles(&[0, 1, 2, 3], 1..8);
        grid.extend(normal_tiles(&[6], 3..4));
        let mut game = session(
            GameMode::Adventure,
            level(LevelKind::Normal, grid),
            Rules::default(),
            vec![dot(Block::Normal), dot(Block::Normal), dot(Block::Normal)],
        );
        assert!(game.use_hero(Hero::Thalion, 6, 3, 0).is_none());
        game.place(0, 0, 0, 0).expect("legal");
        let report = game.place(1, 1, 0, 1000).expect("legal");
        assert_eq!(report.combo, 2);
        assert_eq!(report.unlocked_heroes, vec![Hero::Thalion]);

        let strike = game.use_hero(Hero::Thalion, 6, 3, 1500).expect("armed");
        assert_eq!(strike.cleared.cells.len(), 1);
        assert!(game.use_hero(Hero::Thalion, 6, 3, 1500).is_none());

        let report = game.place(2, 2, 0, 2000).expect("legal");
        assert_eq!(report.combo, 3);
        assert_eq!(report.unlocked_heroes, vec![Hero::Thalion, Hero::Nyx]);
    }

    #[test]
    fn test_heroes_stay_locked_in_casual() {
        let mut game = session(
            GameMode::Casual,
            level(LevelKind::Normal, normal_tiles(&[0, 1], 1..8)),
            Rules::default(),
            vec![],
        );
        game.place(0, 0, 0, 0);
        let report = game.place(1, 1, 0, 10).expect("legal");
        assert_eq!(report.combo, 2);
        assert!(report.unlocked_heroes.is_empty());
    }

    #[test]
    fn test_x_slash_waits_for_second_phase() {
        let mut rules = Rules::default();
        rules.heroes.player = 1;
        let mut grid = normal_tiles(&[0], 1..8);
        grid.extend([(3, 3), (2, 4), (4, 2)].map(|(row, col)| TileOverlay {
            row,
            col,
            block: Block::item("fire"),
        }));
        let mut game = session(GameMode::Adventure, level(LevelKind::Normal, grid), rules, vec![]);
        game.place(0, 0, 0, 0).expect("legal");

        let first = game.use_hero(Hero::Player, 3, 3, 0).expect("armed");
        assert_eq!(first.cleared.cells.len(), 1);
        assert_eq!(first.pending.as_ref().map(|p| p.due_ms), Some(1000));
        assert_eq!(game.state(), SessionState::AwaitingSecondPhase);
        assert!(game.place(1, 6, 6, 0).is_none());
        assert!(game.advance_second_phase(999).is_none());

        let second = game.advance_second_phase(1000).expect("due");
        assert_eq!(second.cleared.cells.len(), 2);
        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(game.goals().collected("fire"), 3);
        assert!(game.advance_second_phase(2000).is_none());
    }

    #[test]
    fn test_second_phase_due_time_saturates() {
        let mut rules = Rules::default();
        rules.heroes.player = 1;
        let mut grid = normal_tiles(&[0], 1..8);
        grid.extend([(3, 3), (2, 4)].map(|(row, col)| TileOverlay {
            row,
            col,
            block: Block::item("fire"),
        }));
        let mut game = session(GameMode::Adventure, level(LevelKind::Normal, grid), rules, vec![]);
        game.place(0, 0, 0, 0).expect("legal");

        let late = u64::MAX - 10;
        let first = game.use_hero(Hero::Player, 3, 3, late).expect("armed");
        assert_eq!(first.pending.map(|p| p.due_ms), Some(u64::MAX));
        assert!(game.advance_second_phase(u64::MAX).is_some());
    }

    #[test]
    fn test_bomb_needs_stock_and_targets() {
        let mut game = session(
            GameMode::Adventure,
            level(LevelKind::Normal, normal_tiles(&[4], 4..5)),
            Rules::default(),
            vec![],
        );
        assert!(game.use_bomb(4, 4).is_none());

        let mut inventory = Inventory::default();
        inventory.set("bomb", 1);
        let mut game = GameSession::with_source(
            GameMode::Adventure,
            level(LevelKind::Normal, normal_tiles(&[4], 4..5)),
            Rules::default(),
            inventory,
            Box::new(FixedPieces::default()),
            1,
        );
        assert!(game.use_bomb(0, 0).is_none());
        assert_eq!(game.inventory().count("bomb"), 1);
        let report = game.use_bomb(5, 5).expect("bomb");
        assert_eq!(report.cleared.cells.len(), 1);
        assert_eq!(game.inventory().count("bomb"), 0);
        assert!(game.board().is_empty());
    }

    #[test]
    fn test_rotate_and_swap() {
        let mut inventory = Inventory::default();
        inventory.set("rotate", 1);
        inventory.set("swap", 1);
        let mut game = GameSession::with_source(
            GameMode::Adventure,
            level(LevelKind::Normal, Vec::new()),
            Rules::default(),
            inventory,
            Box::new(FixedPieces::new([dot(Block::Normal), line_4h(), dot(Block::Normal)])),
            1,
        );
        assert!(!game.use_rotate(0));
        assert!(game.use_rotate(1));
        assert_eq!(game.hand().get(1).map(|p| (p.rows(), p.cols())), Some((4, 1)));
        assert!(!game.use_rotate(1));

        assert!(game.use_swap(2));
        assert!(!game.use_swap(2));
        assert_eq!(game.inventory().count("swap"), 0);
    }

    fn square() -> Piece {
        Piece::filled("square-2x2", &[&[1, 1], &[1, 1]], || Block::Normal)
    }

    fn coal_below_top_row() -> LevelConfig {
        let grid = (1..8)
            .flat_map(|row| {
                (0..8).map(move |col| TileOverlay {
                    row,
                    col,
                    block: Block::obstacle("coal"),
                })
            })
            .collect();
        level(LevelKind::Normal, grid)
    }

    #[test]
    fn test_rotating_the_last_fit_away_loses() {
        let mut inventory = Inventory::default();
        inventory.set("rotate", 1);
        let mut game = GameSession::with_source(
            GameMode::Adventure,
            coal_below_top_row(),
            Rules::default(),
            inventory,
            Box::new(FixedPieces::new([line_4h(), square(), square()])),
            1,
        );
        assert!(game.has_any_legal_move());
        assert!(game.use_rotate(0));
        assert!(!game.has_any_legal_move());
        assert_eq!(game.state(), SessionState::Lost);
        assert!(matches!(game.outcome(), Outcome::Defeat(_)));
    }

    #[test]
    fn test_swapping_the_last_fit_away_loses() {
        let mut inventory = Inventory::default();
        inventory.set("swap", 1);
        let mut game = GameSession::with_source(
            GameMode::Adventure,
            coal_below_top_row(),
            Rules::default(),
            inventory,
            Box::new(FixedPieces::new([line_4h(), square(), square(), square()])),
            1,
        );
        assert!(game.use_swap(0));
        assert_eq!(game.state(), SessionState::Lost);
        assert!(matches!(game.outcome(), Outcome::Defeat(_)));
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut game = session(
            GameMode::Adventure,
            level(LevelKind::Normal, normal_tiles(&[0], 1..8)),
            Rules::default(),
            vec![dot(Block::item("fire"))],
        );
        game.place(0, 0, 0, 0).expect("legal");
        assert_eq!(game.score().points, 10);
        game.restart();
        assert_eq!(game.score().points, 0);
        assert_eq!(game.combo().count(), 0);
        assert_eq!(game.goals().collected("fire"), 0);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.board().empty_cells().len(), 57);
        assert_eq!(game.state(), SessionState::Playing);
    }

    #[test]
    fn test_restart_heals_the_boss() {
        let mut game = session(
            GameMode::Adventure,
            boss_level(20, normal_tiles(&[0], 1..8)),
            Rules::default(),
            vec![dot(Block::item_with_damage("fire", 5))],
        );
        game.place(0, 0, 0, 0).expect("legal");
        assert_eq!(game.boss().current_hp, 15);
        game.restart();
        assert_eq!(game.boss().current_hp, 20);
        assert!(game.boss().is_active());
        assert_eq!(game.combo().last_clear_ms(), None);
    }
}
