use arbor_types::Value;

use crate::error::PersistResult;

/// Somewhere a store's state can be saved to and loaded from.
///
/// Implementations store whole snapshots: every `save` supersedes the
/// previous one, and `load` returns the latest snapshot or `None` if
/// nothing has been saved yet.
pub trait StatePersistor {
    fn load(&self) -> PersistResult<Option<Value>>;

    fn save(&self, state: &Value) -> PersistResult<()>;

    /// Forget the saved snapshot. Returns `true` if there was one.
    fn clear(&self) -> PersistResult<bool>;
}
