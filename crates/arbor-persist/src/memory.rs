use std::cell::{Cell, RefCell};

use arbor_types::Value;

use crate::error::PersistResult;
use crate::traits::StatePersistor;

/// In-memory persistor, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryPersistor {
    snapshot: RefCell<Option<Value>>,
    saves: Cell<u64>,
}

impl MemoryPersistor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_snapshot(state: Value) -> Self {
        Self {
            snapshot: RefCell::new(Some(state)),
            saves: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Value> {
        self.snapshot.borrow().clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> u64 {
        self.saves.get()
    }
}

impl StatePersistor for MemoryPersistor {
    fn load(&self) -> PersistResult<Option<Value>> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, state: &Value) -> PersistResult<()> {
        *self.snapshot.borrow_mut() = Some(state.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn clear(&self) -> PersistResult<bool> {
        Ok(self.snapshot.borrow_mut().take().is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn save_supersedes_and_clear_forgets() {
        let p = MemoryPersistor::new();
        assert_eq!(p.load().unwrap(), None);

        p.save(&json!({ "n": 1 })).unwrap();
        p.save(&json!({ "n": 2 })).unwrap();
        assert_eq!(p.load().unwrap(), Some(json!({ "n": 2 })));
        assert_eq!(p.saves(), 2);

        assert!(p.clear().unwrap());
        assert!(!p.clear().unwrap());
        assert_eq!(p.snapshot(), None);
    }
}
