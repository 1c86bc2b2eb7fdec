use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::TimestampMilliSeconds;

pub const DEFAULT_STARTING_HINTS: u32 = 3;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: String,
    #[serde(default)]
    pub completed_levels: BTreeSet<String>,
    #[serde(default)]
    pub total_score: u32,
    #[serde(default)]
    pub level_scores: BTreeMap<String, u32>,
    /// Seconds, lowest seen per level.
    #[serde(default)]
    pub best_times: BTreeMap<String, u32>,
    #[serde(default)]
    pub unlocked_hints: u32,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub last_played: SystemTime,
}

impl ProgressRecord {
    pub fn new(user_id: impl Into<String>, starting_hints: u32) -> Self {
        Self {
            user_id: user_id.into(),
            completed_levels: BTreeSet::new(),
            total_score: 0,
            level_scores: BTreeMap::new(),
            best_times: BTreeMap::new(),
            unlocked_hints: starting_hints,
            last_played: SystemTime::now(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed_levels.len()
    }

    pub fn has_completed(&self, level_id: &str) -> bool {
        self.completed_levels.contains(level_id)
    }

    /// Adds a completion: set membership is idempotent, score is not.
    pub(crate) fn record_completion(&mut self, level_id: &str, score: u32, time_taken: u32) {
        self.completed_levels.insert(level_id.to_string());
        self.total_score = self.total_score.saturating_add(score);
        self.level_scores.insert(level_id.to_string(), score);

        let improved = self
            .best_times
            .get(level_id)
            .map_or(true, |best| time_taken < *best);
        if improved {
            self.best_times.insert(level_id.to_string(), time_taken);
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_played = SystemTime::now();
    }

    pub(crate) fn apply(&mut self, update: ProgressUpdate) {
        let ProgressUpdate {
            completed_levels,
            total_score,
            level_scores,
            best_times,
            unlocked_hints,
        } = update;

        if let Some(completed_levels) = completed_levels {
            self.completed_levels = completed_levels;
        }
        if let Some(total_score) = total_score {
            self.total_score = total_score;
        }
        if let Some(level_scores) = level_scores {
            self.level_scores = level_scores;
        }
        if let Some(best_times) = best_times {
            self.best_times = best_times;
        }
        if let Some(unlocked_hints) = unlocked_hints {
            self.unlocked_hints = unlocked_hints;
        }
        self.touch();
    }
}

/// Fields to overwrite on a record; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub completed_levels: Option<BTreeSet<String>>,
    pub total_score: Option<u32>,
    pub level_scores: Option<BTreeMap<String, u32>>,
    pub best_times: Option<BTreeMap<String, u32>>,
    pub unlocked_hints: Option<u32>,
}
