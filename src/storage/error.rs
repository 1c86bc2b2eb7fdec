use thiserror::Error;

/// Failures raised by a storage backend. The persistence store logs and
/// absorbs these; they never reach game code.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage quota of {limit} bytes exceeded while writing '{key}'")]
    QuotaExceeded { key: String, limit: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
