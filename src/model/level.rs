use serde::{Deserialize, Serialize};

use super::{Difficulty, ProgressRecord};

/// Gate that must be passed before a level can be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnlockCondition {
    /// At least `value` levels completed.
    Level { value: u32 },
    /// Total score of at least `value`.
    Score { value: u32 },
}

impl UnlockCondition {
    pub fn is_met_by(&self, record: &ProgressRecord) -> bool {
        match self {
            UnlockCondition::Level { value } => record.completed_count() >= *value as usize,
            UnlockCondition::Score { value } => record.total_score >= *value,
        }
    }
}

/// A unit of game content. Fields can be read anywhere but only set through
/// the constructors in this module, so a catalog never changes once built.
#[derive(Debug, Clone, PartialEq)]
#[readonly::make]
pub struct Level<C> {
    pub id: String,
    pub name: String,
    pub description: String,
    pub content: C,
    pub difficulty: Difficulty,
    pub unlock_condition: Option<UnlockCondition>,
    /// Seconds. Shown by timers; completion is never refused for exceeding it.
    pub time_limit: Option<u32>,
}

impl<C> Level<C> {
    pub fn new(id: impl Into<String>, name: impl Into<String>, difficulty: Difficulty, content: C) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            content,
            difficulty,
            unlock_condition: None,
            time_limit: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn unlocked_by(mut self, condition: UnlockCondition) -> Self {
        self.unlock_condition = Some(condition);
        self
    }

    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit = Some(seconds);
        self
    }
}

/// Number of scoreable items in a level: words, differences, prompts.
pub trait LevelContent {
    fn item_count(&self) -> usize;
}

impl<T> LevelContent for Vec<T> {
    fn item_count(&self) -> usize {
        self.len()
    }
}

/// Ordered, immutable list of levels for one game.
#[derive(Debug, Clone)]
pub struct LevelCatalog<C> {
    levels: Vec<Level<C>>,
}

impl<C> LevelCatalog<C> {
    pub fn new(levels: Vec<Level<C>>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &[Level<C>] {
        &self.levels
    }

    pub fn level_by_id(&self, level_id: &str) -> Option<&Level<C>> {
        self.levels.iter().find(|level| level.id == level_id)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
