use super::progress_ledger::ProgressLedger;
use super::scoring::GameRules;
use super::settings::Settings;
use crate::model::{Difficulty, Level, LevelCatalog, UnlockCondition};
use crate::storage::PersistenceStore;

pub const GAME_ID: &str = "puzzle";

/// Accuracy-scored, 30 seconds per prompt.
pub const RULES: GameRules = GameRules::new(30);

pub type PuzzleLedger = ProgressLedger<Vec<String>>;

fn prompts(list: &[&str]) -> Vec<String> {
    list.iter().map(|prompt| prompt.to_string()).collect()
}

pub fn catalog() -> LevelCatalog<Vec<String>> {
    LevelCatalog::new(vec![
        Level::new(
            "pz-1",
            "First Look",
            Difficulty::Easy,
            prompts(&[
                "Which work has the most likes this week?",
                "Which creator posted most recently?",
                "Which tag appears on every featured work?",
            ]),
        ),
        Level::new(
            "pz-2",
            "Close Reading",
            Difficulty::Medium,
            prompts(&[
                "Match the comment to its work.",
                "Order these works by publish date.",
                "Which scheduled post goes live first?",
                "Which works share a creator?",
            ]),
        )
        .unlocked_by(UnlockCondition::Level { value: 1 }),
        Level::new(
            "pz-3",
            "Curator",
            Difficulty::Hard,
            prompts(&[
                "Pick the work that starts the trending list.",
                "Find the two works with identical tags.",
                "Which creator replied to the most comments?",
                "Which work gained the most likes overnight?",
                "Order the chat messages by time.",
            ]),
        )
        .unlocked_by(UnlockCondition::Level { value: 2 })
        .with_time_limit(150),
    ])
}

pub fn service(store: &PersistenceStore, settings: &Settings) -> PuzzleLedger {
    ProgressLedger::from_settings(catalog(), RULES, store.namespace(GAME_ID), settings)
}
