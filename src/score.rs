//! Scoring

use serde::Serialize;

/// Score tracking for a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total lines cleared (rows and columns)
    pub lines: u32,
    /// Number of clearing passes that removed at least one line
    pub clears: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points for one clearing pass and return the points gained.
    /// Quadratic in the lines cleared together, linear in the combo.
    pub fn add_clear(&mut self, lines: usize, combo_multiplier: u32, points_per_line: u64) -> u64 {
        if lines == 0 {
            return 0;
        }
        let lines = lines as u64;
        let gained = lines * points_per_line * lines * u64::from(combo_multiplier.max(1));
        self.points += gained;
        self.lines += lines as u32;
        self.clears += 1;
        gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut score = Score::new();
        assert_eq!(score.add_clear(1, 1, 10), 10);
        assert_eq!(score.points, 10);
        assert_eq!(score.lines, 1);
    }

    #[test]
    fn test_multi_line_is_quadratic() {
        let mut score = Score::new();
        assert_eq!(score.add_clear(2, 1, 10), 40);
        assert_eq!(score.add_clear(3, 1, 10), 90);
        assert_eq!(score.points, 130);
        assert_eq!(score.lines, 5);
        assert_eq!(score.clears, 2);
    }

    #[test]
    fn test_combo_multiplies() {
        let mut score = Score::new();
        assert_eq!(score.add_clear(2, 3, 10), 120);
    }

    #[test]
    fn test_nothing_cleared_scores_nothing() {
        let mut score = Score::new();
        assert_eq!(score.add_clear(0, 5, 10), 0);
        assert_eq!(score, Score::default());
    }
}
