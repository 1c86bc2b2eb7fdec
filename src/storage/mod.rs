mod backend;
mod error;
mod file_backend;
mod memory_backend;
mod persistence_store;
#[cfg(feature = "web")]
mod web_backend;

pub use backend::{shared, SharedBackend, StorageBackend};
pub use error::StorageError;
pub use file_backend::FileBackend;
pub use memory_backend::MemoryBackend;
pub use persistence_store::PersistenceStore;
#[cfg(feature = "web")]
pub use web_backend::WebStorageBackend;
