use log::info;

use super::puzzle::{self, PuzzleLedger};
use super::settings::Settings;
use super::spot_difference::{self, SpotDifferenceLedger};
use super::word_chain::{self, WordChainLedger};
use crate::storage::{shared, FileBackend, PersistenceStore, SharedBackend, StorageError};

/// Every game's ledger, built once by the application and handed to
/// whatever needs it. All ledgers share one backend, each under its own
/// namespace beneath `settings.storage_prefix`.
pub struct GameServices {
    pub word_chain: WordChainLedger,
    pub spot_difference: SpotDifferenceLedger,
    pub puzzle: PuzzleLedger,
    store: PersistenceStore,
}

impl GameServices {
    pub fn new(backend: SharedBackend, settings: &Settings) -> Self {
        let store = PersistenceStore::new(settings.storage_prefix.clone(), backend);
        Self {
            word_chain: word_chain::service(&store, settings),
            spot_difference: spot_difference::service(&store, settings),
            puzzle: puzzle::service(&store, settings),
            store,
        }
    }

    /// Builds the services over the file backend in the settings' data
    /// directory.
    pub fn open(settings: &Settings) -> Result<Self, StorageError> {
        let backend = FileBackend::open(settings.storage_path())?;
        info!(target: "storage", "Using storage file {}", backend.path().display());
        Ok(Self::new(shared(backend), settings))
    }

    pub fn store(&self) -> &PersistenceStore {
        &self.store
    }

    /// Erases stored progress for every game.
    pub fn reset_all(&mut self) {
        self.word_chain.reset_all();
        self.spot_difference.reset_all();
        self.puzzle.reset_all();
    }
}
