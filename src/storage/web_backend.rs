use web_sys::Storage;

use super::{StorageBackend, StorageError};

/// `window.localStorage`, for builds running in a browser. Only built with the
/// `web` feature; native test runs cover the same contract through
/// `MemoryBackend` and `FileBackend`.
pub struct WebStorageBackend {
    storage: Storage,
}

impl WebStorageBackend {
    pub fn local() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .ok()
            .flatten()
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

fn js_error(action: &str, key: &str) -> StorageError {
    StorageError::Unavailable(format!("localStorage {action} failed for '{key}'"))
}

impl StorageBackend for WebStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|_| js_error("get", key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(|_| js_error("set", key))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(|_| js_error("remove", key))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let len = self.storage.length().map_err(|_| js_error("length", ""))?;
        let mut keys = Vec::with_capacity(len as usize);
        for index in 0..len {
            if let Some(key) = self.storage.key(index).map_err(|_| js_error("key", ""))? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
