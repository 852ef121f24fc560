use arbor_types::DispatchError;

/// Errors from loading or saving store state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store rejected the persisted state.
    #[error("store rejected persisted state: {0}")]
    Store(#[from] DispatchError),
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;
