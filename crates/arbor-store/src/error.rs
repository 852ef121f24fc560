use arbor_module::ConfigError;
use arbor_types::DispatchError;

/// Errors from building, composing, or driving a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A module descriptor could not be installed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An accessor invocation failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Stores could not be combined into an aggregate.
    #[error("cannot compose store '{name}': {reason}")]
    Composition { name: String, reason: String },

    /// A store configuration file could not be parsed.
    #[error("invalid store configuration: {0}")]
    ConfigFile(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
