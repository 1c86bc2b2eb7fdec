use std::time::SystemTime;

use itertools::Itertools;
use log::{error, trace, warn};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::TimestampMilliSeconds;

use super::{SharedBackend, StorageError};

#[serde_as]
#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    data: &'a T,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    timestamp: SystemTime,
}

#[serde_as]
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    timestamp: SystemTime,
}

/// JSON values stored under `{prefix}_{key}` in a shared backend. Every value
/// is wrapped with the time it was written.
///
/// Nothing here returns an error: failed writes are logged and dropped, and
/// unreadable values load as the caller's default.
#[derive(Clone)]
pub struct PersistenceStore {
    prefix: String,
    backend: SharedBackend,
}

impl std::fmt::Debug for PersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PersistenceStore {{ prefix: {:?} }}", self.prefix)
    }
}

impl PersistenceStore {
    pub fn new(prefix: impl Into<String>, backend: SharedBackend) -> Self {
        Self {
            prefix: prefix.into(),
            backend,
        }
    }

    /// A store for `{prefix}_{child}` on the same backend. Clearing the
    /// parent also clears the child.
    pub fn namespace(&self, child: &str) -> Self {
        Self::new(self.full_key(child), self.backend.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key)
    }

    fn namespace_marker(&self) -> String {
        format!("{}_", self.prefix)
    }

    pub fn save<T: Serialize>(&self, key: &str, data: &T) {
        if let Err(err) = self.try_save(key, data) {
            error!(target: "storage", "Failed to save '{}': {}", self.full_key(key), err);
        }
    }

    fn try_save<T: Serialize>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let envelope = EnvelopeRef {
            data,
            timestamp: SystemTime::now(),
        };
        let contents = serde_json::to_string(&envelope)?;
        trace!(target: "storage", "Saving {} bytes to '{}'", contents.len(), self.full_key(key));
        self.backend.borrow_mut().set(&self.full_key(key), &contents)
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read_envelope::<T>(key) {
            Some(envelope) => envelope.data,
            None => default,
        }
    }

    /// When the value under `key` was last written.
    pub fn saved_at(&self, key: &str) -> Option<SystemTime> {
        self.read_envelope::<IgnoredAny>(key)
            .map(|envelope| envelope.timestamp)
    }

    fn read_envelope<T: DeserializeOwned>(&self, key: &str) -> Option<Envelope<T>> {
        let full_key = self.full_key(key);
        let raw = match self.backend.borrow().get(&full_key) {
            Ok(raw) => raw?,
            Err(err) => {
                error!(target: "storage", "Failed to read '{}': {}", full_key, err);
                return None;
            }
        };

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                warn!(target: "storage", "Discarding unreadable value at '{}': {}", full_key, err);
                None
            }
        }
    }

    pub fn clear(&self, key: &str) {
        let full_key = self.full_key(key);
        if let Err(err) = self.backend.borrow_mut().remove(&full_key) {
            error!(target: "storage", "Failed to clear '{}': {}", full_key, err);
        }
    }

    /// Removes every key in this namespace, leaving other keys alone.
    pub fn clear_all(&self) {
        let marker = self.namespace_marker();
        let keys = match self.backend.borrow().keys() {
            Ok(keys) => keys,
            Err(err) => {
                error!(target: "storage", "Failed to list keys for '{}': {}", self.prefix, err);
                return;
            }
        };

        let mut backend = self.backend.borrow_mut();
        for key in keys.iter().filter(|key| key.starts_with(&marker)) {
            if let Err(err) = backend.remove(key) {
                error!(target: "storage", "Failed to clear '{}': {}", key, err);
            }
        }
    }

    /// Keys in this namespace with the prefix stripped, sorted.
    pub fn get_all_keys(&self) -> Vec<String> {
        let marker = self.namespace_marker();
        match self.backend.borrow().keys() {
            Ok(keys) => keys
                .iter()
                .filter_map(|key| key.strip_prefix(&marker))
                .map(str::to_string)
                .sorted()
                .collect(),
            Err(err) => {
                error!(target: "storage", "Failed to list keys for '{}': {}", self.prefix, err);
                Vec::new()
            }
        }
    }
}
