use std::cell::RefCell;
use std::rc::Rc;

use super::StorageError;

/// Flat, synchronous string key-value storage, the shape of browser local
/// storage. Keys are shared by every consumer of the backend.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

pub type SharedBackend = Rc<RefCell<dyn StorageBackend>>;

pub fn shared<B: StorageBackend + 'static>(backend: B) -> SharedBackend {
    Rc::new(RefCell::new(backend))
}
