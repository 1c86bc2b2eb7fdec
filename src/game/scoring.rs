use crate::model::Difficulty;

/// What a level attempt is measured by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBasis {
    /// `correct` out of the level's items, worth up to 100 points.
    Accuracy { correct: u32 },
    /// Length of the chain built, 10 points per link.
    Chain { length: u32 },
}

/// Per-game scoring constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    /// Seconds allowed per item before the time bonus runs out.
    pub seconds_per_item: u32,
}

impl GameRules {
    pub const fn new(seconds_per_item: u32) -> Self {
        Self { seconds_per_item }
    }

    pub fn calculate_score(
        &self,
        basis: ScoreBasis,
        total: u32,
        time_taken: u32,
        difficulty: Difficulty,
    ) -> u32 {
        calculate_score(basis, total, time_taken, difficulty, self.seconds_per_item)
    }
}

pub fn calculate_score(
    basis: ScoreBasis,
    total: u32,
    time_taken: u32,
    difficulty: Difficulty,
    seconds_per_item: u32,
) -> u32 {
    let base = match basis {
        ScoreBasis::Accuracy { .. } if total == 0 => 0.0,
        ScoreBasis::Accuracy { correct } => (correct as f64 / total as f64 * 100.0).round(),
        ScoreBasis::Chain { length } => length as f64 * 10.0,
    };

    let expected_time = seconds_per_item as f64 * total as f64;
    let spare_time = (expected_time - time_taken as f64).max(0.0);
    let time_bonus = spare_time * difficulty.time_bonus_multiplier();

    ((base + time_bonus) * difficulty.score_multiplier()).round() as u32
}
