use std::collections::HashMap;

use log::{debug, info, trace, warn};

use super::scoring::{GameRules, ScoreBasis};
use super::settings::{Settings, UnknownLevelPolicy, UnknownUserPolicy};
use crate::events::{SubscriptionId, Subscribers};
use crate::model::{
    Difficulty, Level, LevelCatalog, LevelContent, ProgressEvent, ProgressRecord, ProgressUpdate,
};
use crate::storage::PersistenceStore;

const PROGRESS_KEY: &str = "progress";

pub type RecordFactory = Box<dyn Fn(&str) -> ProgressRecord>;

/// Per-user progress for one game.
///
/// The ledger owns its map of records and is the only writer of its store
/// namespace. Every mutation is persisted before it returns and then
/// announced to subscribers. Storage failures are absorbed by the store, so
/// the in-memory record stays authoritative for the rest of the session.
pub struct ProgressLedger<C> {
    catalog: LevelCatalog<C>,
    rules: GameRules,
    store: PersistenceStore,
    records: HashMap<String, ProgressRecord>,
    default_record: RecordFactory,
    unknown_level_policy: UnknownLevelPolicy,
    unknown_user_policy: UnknownUserPolicy,
    subscribers: Subscribers<ProgressEvent>,
}

impl<C: LevelContent> ProgressLedger<C> {
    pub fn new<F>(
        catalog: LevelCatalog<C>,
        rules: GameRules,
        store: PersistenceStore,
        default_record: F,
    ) -> Self
    where
        F: Fn(&str) -> ProgressRecord + 'static,
    {
        let records = store.load(PROGRESS_KEY, HashMap::new());
        debug!(target: "ledger", "Loaded {} progress records from '{}'", records.len(), store.prefix());

        Self {
            catalog,
            rules,
            store,
            records,
            default_record: Box::new(default_record),
            unknown_level_policy: UnknownLevelPolicy::default(),
            unknown_user_policy: UnknownUserPolicy::default(),
            subscribers: Subscribers::new(),
        }
    }

    pub fn from_settings(
        catalog: LevelCatalog<C>,
        rules: GameRules,
        store: PersistenceStore,
        settings: &Settings,
    ) -> Self {
        let starting_hints = settings.starting_hints;
        Self::new(catalog, rules, store, move |user_id| {
            ProgressRecord::new(user_id, starting_hints)
        })
        .with_policies(settings.unknown_level_policy, settings.unknown_user_policy)
    }

    pub fn with_policies(
        mut self,
        unknown_level_policy: UnknownLevelPolicy,
        unknown_user_policy: UnknownUserPolicy,
    ) -> Self {
        self.unknown_level_policy = unknown_level_policy;
        self.unknown_user_policy = unknown_user_policy;
        self
    }

    pub fn levels(&self) -> &[Level<C>] {
        self.catalog.levels()
    }

    pub fn level_by_id(&self, level_id: &str) -> Option<&Level<C>> {
        self.catalog.level_by_id(level_id)
    }

    pub fn rules(&self) -> GameRules {
        self.rules
    }

    pub fn store(&self) -> &PersistenceStore {
        &self.store
    }

    pub fn get_progress(&mut self, user_id: &str) -> ProgressRecord {
        if let Some(record) = self.records.get(user_id) {
            return record.clone();
        }

        let record = (self.default_record)(user_id);
        if self.unknown_user_policy == UnknownUserPolicy::Initialize {
            debug!(target: "ledger", "Initializing progress for '{}'", user_id);
            self.records.insert(user_id.to_string(), record.clone());
            self.persist();
        }
        record
    }

    pub fn update_progress(&mut self, user_id: &str, update: ProgressUpdate) -> ProgressRecord {
        let record = self.record_mut(user_id);
        record.apply(update);
        let record = record.clone();

        self.persist();
        self.subscribers.emit(&ProgressEvent::ProgressUpdated {
            user_id: user_id.to_string(),
        });
        record
    }

    pub fn is_level_unlocked(&mut self, user_id: &str, level_id: &str) -> bool {
        let record = self.get_progress(user_id);
        self.is_unlocked_for(&record, level_id)
    }

    fn is_unlocked_for(&self, record: &ProgressRecord, level_id: &str) -> bool {
        match self.catalog.level_by_id(level_id) {
            None => {
                trace!(target: "ledger", "Unknown level '{}', policy {:?}", level_id, self.unknown_level_policy);
                self.unknown_level_policy == UnknownLevelPolicy::Open
            }
            Some(level) => level
                .unlock_condition
                .map_or(true, |condition| condition.is_met_by(record)),
        }
    }

    /// Catalog levels the user may play, in catalog order.
    pub fn unlocked_levels(&mut self, user_id: &str) -> Vec<&Level<C>> {
        let record = self.get_progress(user_id);
        self.catalog
            .levels()
            .iter()
            .filter(|level| self.is_unlocked_for(&record, &level.id))
            .collect()
    }

    /// First playable level the user has not completed yet.
    pub fn next_level(&mut self, user_id: &str) -> Option<&Level<C>> {
        let record = self.get_progress(user_id);
        self.catalog
            .levels()
            .iter()
            .find(|level| !record.has_completed(&level.id) && self.is_unlocked_for(&record, &level.id))
    }

    pub fn complete_level(
        &mut self,
        user_id: &str,
        level_id: &str,
        score: u32,
        time_taken: u32,
    ) -> ProgressRecord {
        if self.catalog.level_by_id(level_id).is_none() {
            if self.unknown_level_policy == UnknownLevelPolicy::Closed {
                warn!(target: "ledger", "Refusing completion of unknown level '{}'", level_id);
                return self
                    .records
                    .get(user_id)
                    .cloned()
                    .unwrap_or_else(|| (self.default_record)(user_id));
            }
            warn!(target: "ledger", "Recording completion of unknown level '{}'", level_id);
        }

        let record = self.record_mut(user_id);
        record.record_completion(level_id, score, time_taken);
        record.touch();
        let record = record.clone();

        info!(
            target: "ledger",
            "'{}' completed '{}' with {} points in {}s (total {})",
            user_id, level_id, score, time_taken, record.total_score
        );
        self.persist();
        self.subscribers.emit(&ProgressEvent::LevelCompleted {
            user_id: user_id.to_string(),
            level_id: level_id.to_string(),
            score,
            time_taken,
        });
        record
    }

    pub fn calculate_score(
        &self,
        basis: ScoreBasis,
        total: u32,
        time_taken: u32,
        difficulty: Difficulty,
    ) -> u32 {
        self.rules.calculate_score(basis, total, time_taken, difficulty)
    }

    /// Score for an attempt at a catalog level, using its item count and
    /// difficulty. `None` for unknown levels.
    pub fn score_level(&self, level_id: &str, basis: ScoreBasis, time_taken: u32) -> Option<u32> {
        let level = self.catalog.level_by_id(level_id)?;
        let total = level.content.item_count() as u32;
        Some(self.calculate_score(basis, total, time_taken, level.difficulty))
    }

    /// Spends one hint. Refused, with nothing changed, when none are left.
    pub fn use_hint(&mut self, user_id: &str) -> bool {
        let available = self
            .records
            .get(user_id)
            .map_or_else(|| (self.default_record)(user_id).unlocked_hints, |r| r.unlocked_hints);
        if available == 0 {
            debug!(target: "ledger", "'{}' has no hints left", user_id);
            return false;
        }

        let record = self.record_mut(user_id);
        record.unlocked_hints -= 1;
        record.touch();
        let remaining = record.unlocked_hints;

        self.persist();
        self.subscribers.emit(&ProgressEvent::HintUsed {
            user_id: user_id.to_string(),
            remaining,
        });
        true
    }

    /// Grants one hint and returns the new balance.
    pub fn unlock_hint(&mut self, user_id: &str) -> u32 {
        let record = self.record_mut(user_id);
        record.unlocked_hints = record.unlocked_hints.saturating_add(1);
        record.touch();
        let remaining = record.unlocked_hints;

        self.persist();
        self.subscribers.emit(&ProgressEvent::HintUnlocked {
            user_id: user_id.to_string(),
            remaining,
        });
        remaining
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ProgressEvent) + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Drops in-memory records and reads them back from storage.
    pub fn reload(&mut self) {
        self.records = self.store.load(PROGRESS_KEY, HashMap::new());
    }

    /// Erases every record this game has stored.
    pub fn reset_all(&mut self) {
        info!(target: "ledger", "Clearing all progress under '{}'", self.store.prefix());
        self.store.clear_all();
        self.records.clear();
        self.subscribers.emit(&ProgressEvent::ProgressReset);
    }

    fn record_mut(&mut self, user_id: &str) -> &mut ProgressRecord {
        let default_record = &self.default_record;
        self.records
            .entry(user_id.to_string())
            .or_insert_with(|| default_record(user_id))
    }

    fn persist(&self) {
        self.store.save(PROGRESS_KEY, &self.records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UnlockCondition, DEFAULT_STARTING_HINTS};
    use crate::storage::{shared, MemoryBackend, SharedBackend};
    use crate::tests::UsingLogger;
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_context::test_context;

    fn test_catalog() -> LevelCatalog<Vec<String>> {
        let items = |n: usize| (0..n).map(|i| format!("item{i}")).collect::<Vec<_>>();
        LevelCatalog::new(vec![
            Level::new("intro", "Intro", Difficulty::Easy, items(3)),
            Level::new("second", "Second", Difficulty::Medium, items(4))
                .unlocked_by(UnlockCondition::Level { value: 1 }),
            Level::new("gated", "Gated", Difficulty::Hard, items(5))
                .unlocked_by(UnlockCondition::Level { value: 2 }),
            Level::new("rich", "Rich", Difficulty::Hard, items(5))
                .unlocked_by(UnlockCondition::Score { value: 200 }),
        ])
    }

    fn ledger_on(backend: SharedBackend, settings: &Settings) -> ProgressLedger<Vec<String>> {
        let store = PersistenceStore::new("test", backend);
        ProgressLedger::from_settings(test_catalog(), GameRules::new(20), store, settings)
    }

    fn new_ledger() -> (ProgressLedger<Vec<String>>, SharedBackend) {
        let backend = shared(MemoryBackend::new());
        (ledger_on(backend.clone(), &Settings::default()), backend)
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_unseen_user_gets_default_record(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        let record = ledger.get_progress("newcomer");

        assert_eq!(record.user_id, "newcomer");
        assert!(record.completed_levels.is_empty());
        assert_eq!(record.total_score, 0);
        assert_eq!(record.unlocked_hints, DEFAULT_STARTING_HINTS);
        assert_eq!(ledger.store().get_all_keys(), vec!["progress".to_string()]);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_transient_policy_defers_storage(_: &mut UsingLogger) {
        let backend = shared(MemoryBackend::new());
        let settings = Settings {
            unknown_user_policy: UnknownUserPolicy::Transient,
            ..Settings::default()
        };
        let mut ledger = ledger_on(backend, &settings);

        assert_eq!(ledger.get_progress("ghost").unlocked_hints, 3);
        assert!(ledger.store().get_all_keys().is_empty());

        ledger.unlock_hint("ghost");
        assert_eq!(ledger.get_progress("ghost").unlocked_hints, 4);
        assert_eq!(ledger.store().get_all_keys(), vec!["progress".to_string()]);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_repeat_completion_accumulates_score(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        ledger.complete_level("u", "intro", 40, 30);
        let record = ledger.complete_level("u", "intro", 40, 25);

        assert_eq!(record.completed_levels.len(), 1);
        assert!(record.has_completed("intro"));
        assert_eq!(record.total_score, 80);
        assert_eq!(record.level_scores["intro"], 40);
        assert_eq!(record.best_times["intro"], 25);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_best_time_never_regresses(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        ledger.complete_level("u", "intro", 10, 50);
        assert_eq!(ledger.complete_level("u", "intro", 10, 30).best_times["intro"], 30);
        assert_eq!(ledger.complete_level("u", "intro", 10, 45).best_times["intro"], 30);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_completion_keeps_maps_in_step(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        ledger.complete_level("u", "intro", 10, 50);
        let record = ledger.complete_level("u", "second", 20, 40);

        for level_id in &record.completed_levels {
            assert!(record.level_scores.contains_key(level_id));
            assert!(record.best_times.contains_key(level_id));
        }
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_progress_survives_new_ledger(_: &mut UsingLogger) {
        let (mut ledger, backend) = new_ledger();
        ledger.complete_level("u", "intro", 55, 12);
        assert!(ledger.use_hint("u"));

        let mut reopened = ledger_on(backend, &Settings::default());
        let record = reopened.get_progress("u");
        assert_eq!(record.total_score, 55);
        assert_eq!(record.best_times["intro"], 12);
        assert_eq!(record.unlocked_hints, 2);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_level_count_unlock(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        assert!(ledger.is_level_unlocked("u", "intro"));
        assert!(!ledger.is_level_unlocked("u", "gated"));

        ledger.complete_level("u", "intro", 10, 10);
        assert!(ledger.is_level_unlocked("u", "second"));
        assert!(!ledger.is_level_unlocked("u", "gated"));

        ledger.complete_level("u", "second", 10, 10);
        assert!(ledger.is_level_unlocked("u", "gated"));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_score_unlock(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        ledger.complete_level("u", "intro", 150, 10);
        assert!(!ledger.is_level_unlocked("u", "rich"));

        ledger.complete_level("u", "intro", 50, 10);
        assert!(ledger.is_level_unlocked("u", "rich"));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_unknown_level_follows_policy(_: &mut UsingLogger) {
        let (mut open, _) = new_ledger();
        assert!(open.is_level_unlocked("u", "no-such-level"));

        let settings = Settings {
            unknown_level_policy: UnknownLevelPolicy::Closed,
            ..Settings::default()
        };
        let mut closed = ledger_on(shared(MemoryBackend::new()), &settings);
        assert!(!closed.is_level_unlocked("u", "no-such-level"));
        assert!(closed.is_level_unlocked("u", "intro"));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_closed_policy_refuses_unknown_completions(_: &mut UsingLogger) {
        let settings = Settings {
            unknown_level_policy: UnknownLevelPolicy::Closed,
            ..Settings::default()
        };
        let mut ledger = ledger_on(shared(MemoryBackend::new()), &settings);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        ledger.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        ledger.complete_level("u", "bogus1", 50, 10);
        let record = ledger.complete_level("u", "bogus2", 50, 10);

        assert!(record.completed_levels.is_empty());
        assert_eq!(record.total_score, 0);
        assert!(!ledger.is_level_unlocked("u", "gated"));
        assert!(seen.borrow().is_empty());

        ledger.reload();
        assert!(ledger.get_progress("u").completed_levels.is_empty());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_hint_balance_never_negative(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        assert!(ledger.use_hint("u"));
        assert!(ledger.use_hint("u"));
        assert!(ledger.use_hint("u"));
        assert!(!ledger.use_hint("u"));
        assert_eq!(ledger.get_progress("u").unlocked_hints, 0);

        assert_eq!(ledger.unlock_hint("u"), 1);
        assert!(ledger.use_hint("u"));
        assert!(!ledger.use_hint("u"));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_update_merges_fields(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        ledger.complete_level("u", "intro", 30, 20);

        let record = ledger.update_progress(
            "u",
            ProgressUpdate {
                total_score: Some(500),
                ..Default::default()
            },
        );

        assert_eq!(record.total_score, 500);
        assert!(record.has_completed("intro"));
        assert_eq!(record.unlocked_hints, 3);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_unlocked_and_next_levels(_: &mut UsingLogger) {
        fn ids(levels: Vec<&Level<Vec<String>>>) -> Vec<String> {
            levels.iter().map(|l| l.id.clone()).collect()
        }
        let (mut ledger, _) = new_ledger();

        assert_eq!(ids(ledger.unlocked_levels("u")), vec!["intro"]);
        assert_eq!(ledger.next_level("u").map(|l| l.id.clone()), Some("intro".to_string()));

        ledger.complete_level("u", "intro", 10, 10);
        assert_eq!(ids(ledger.unlocked_levels("u")), vec!["intro", "second"]);
        assert_eq!(ledger.next_level("u").map(|l| l.id.clone()), Some("second".to_string()));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_score_level_uses_catalog(_: &mut UsingLogger) {
        let (ledger, _) = new_ledger();
        // 5 items, hard, perfect and instant
        assert_eq!(ledger.score_level("gated", ScoreBasis::Accuracy { correct: 5 }, 0), Some(270));
        assert_eq!(ledger.score_level("missing", ScoreBasis::Accuracy { correct: 5 }, 0), None);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_subscribers_see_each_mutation(_: &mut UsingLogger) {
        let (mut ledger, _) = new_ledger();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = ledger.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        ledger.complete_level("u", "intro", 10, 5);
        ledger.use_hint("u");
        ledger.get_progress("u");
        assert!(ledger.unsubscribe(id));
        ledger.unlock_hint("u");
        ledger.reset_all();

        assert!(seen.borrow().iter().all(|event| event.user_id() == Some("u")));
        assert_eq!(
            *seen.borrow(),
            vec![
                ProgressEvent::LevelCompleted {
                    user_id: "u".to_string(),
                    level_id: "intro".to_string(),
                    score: 10,
                    time_taken: 5,
                },
                ProgressEvent::HintUsed {
                    user_id: "u".to_string(),
                    remaining: 2,
                },
            ]
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_failed_save_keeps_memory_and_reverts_on_reload(_: &mut UsingLogger) {
        let backend = shared(MemoryBackend::with_quota(400));
        let mut ledger = ledger_on(backend, &Settings::default());
        ledger.complete_level("u", "intro", 10, 5);

        let long_id = "x".repeat(500);
        let record = ledger.complete_level("u", &long_id, 20, 5);
        assert_eq!(record.total_score, 30);

        ledger.reload();
        assert_eq!(ledger.get_progress("u").total_score, 10);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_reset_all_clears_storage(_: &mut UsingLogger) {
        let (mut ledger, backend) = new_ledger();
        ledger.complete_level("u", "intro", 10, 5);
        backend.borrow_mut().set("unrelated", "1").unwrap();

        ledger.reset_all();

        assert!(ledger.store().get_all_keys().is_empty());
        assert!(backend.borrow().get("unrelated").unwrap().is_some());
        ledger.reload();
        assert_eq!(ledger.get_progress("u").total_score, 0);
    }
}
