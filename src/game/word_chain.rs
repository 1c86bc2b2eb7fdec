use std::collections::HashSet;

use super::progress_ledger::ProgressLedger;
use super::scoring::GameRules;
use super::settings::Settings;
use crate::model::{Difficulty, Level, LevelCatalog, UnlockCondition};
use crate::storage::PersistenceStore;

pub const GAME_ID: &str = "word_chain";

/// Chains are scored by length, with 30 seconds allowed per word.
pub const RULES: GameRules = GameRules::new(30);

pub type WordChainLedger = ProgressLedger<Vec<String>>;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| word.to_string()).collect()
}

/// Each level's content is a reference chain; its length sets the expected time.
pub fn catalog() -> LevelCatalog<Vec<String>> {
    LevelCatalog::new(vec![
        Level::new(
            "wc-1",
            "Warm Up",
            Difficulty::Easy,
            words(&["apple", "egg", "giraffe", "elephant", "tiger"]),
        )
        .with_description("Link five everyday words."),
        Level::new(
            "wc-2",
            "Nature Walk",
            Difficulty::Easy,
            words(&["river", "rain", "night", "tree", "echo", "owl"]),
        )
        .with_description("Six words from outdoors.")
        .unlocked_by(UnlockCondition::Level { value: 1 }),
        Level::new(
            "wc-3",
            "Evening Lights",
            Difficulty::Medium,
            words(&["sunset", "tunnel", "lantern", "needle", "engine", "eclipse", "emerald"]),
        )
        .with_description("Seven links, three of them on the letter e.")
        .unlocked_by(UnlockCondition::Level { value: 2 })
        .with_time_limit(180),
        Level::new(
            "wc-4",
            "Long Haul",
            Difficulty::Hard,
            words(&[
                "keyboard",
                "dolphin",
                "nebula",
                "anchor",
                "rhythm",
                "marathon",
                "navigator",
                "reservoir",
            ]),
        )
        .with_description("Eight words against the clock.")
        .unlocked_by(UnlockCondition::Score { value: 300 })
        .with_time_limit(240),
    ])
}

pub fn service(store: &PersistenceStore, settings: &Settings) -> WordChainLedger {
    ProgressLedger::from_settings(catalog(), RULES, store.namespace(GAME_ID), settings)
}

/// `next` must start with the letter `previous` ends with, ignoring case.
pub fn is_valid_link(previous: &str, next: &str) -> bool {
    match (previous.chars().last(), next.chars().next()) {
        (Some(last), Some(first)) => last.to_lowercase().eq(first.to_lowercase()),
        _ => false,
    }
}

/// Number of words in the longest valid chain at the start of `words`.
/// A repeated word ends the chain.
pub fn chain_length<S: AsRef<str>>(words: &[S]) -> u32 {
    let mut seen = HashSet::new();
    let mut length = 0;
    let mut previous: Option<&str> = None;

    for word in words {
        let word: &str = word.as_ref();
        if word.is_empty() || !seen.insert(word.to_lowercase()) {
            break;
        }
        if let Some(previous) = previous {
            if !is_valid_link(previous, word) {
                break;
            }
        }
        previous = Some(word);
        length += 1;
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ScoreBasis;
    use crate::storage::{shared, MemoryBackend};

    #[test]
    fn test_catalog_chains_are_valid() {
        for level in catalog().levels() {
            assert_eq!(
                chain_length(&level.content) as usize,
                level.content.len(),
                "level {} has a broken chain",
                level.id
            );
        }
    }

    #[test]
    fn test_links() {
        assert!(is_valid_link("apple", "Egg"));
        assert!(!is_valid_link("apple", "tiger"));
        assert!(!is_valid_link("", "egg"));
    }

    #[test]
    fn test_chain_stops_at_break_or_repeat() {
        assert_eq!(chain_length(&["apple", "egg", "goat", "banana"]), 3);
        assert_eq!(chain_length(&["eye", "eye"]), 1);
        assert_eq!(chain_length::<&str>(&[]), 0);
    }

    #[test]
    fn test_service_scores_chains() {
        let store = PersistenceStore::new("minigames", shared(MemoryBackend::new()));
        let ledger = service(&store, &Settings::default());

        assert_eq!(ledger.store().prefix(), "minigames_word_chain");
        // 5 words on easy: base 50, bonus (150 - 100) * 0.3 = 15
        assert_eq!(ledger.score_level("wc-1", ScoreBasis::Chain { length: 5 }, 100), Some(65));
    }
}
