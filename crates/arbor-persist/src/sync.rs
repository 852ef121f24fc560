//! Wiring persistors to stores.

use std::rc::Rc;

use arbor_store::{Store, Subscription};
use arbor_types::Slice;
use tracing::{debug, warn};

use crate::error::PersistResult;
use crate::traits::StatePersistor;

/// Load the latest snapshot from `persistor` into `store`.
///
/// Returns whether a snapshot was found. The snapshot must contain every
/// installed module with its slice kind; otherwise the store is left as is
/// and the rejection is returned.
pub fn restore(store: &Store, persistor: &dyn StatePersistor) -> PersistResult<bool> {
    let Some(state) = persistor.load()? else {
        debug!(store = %store.name(), "no snapshot to restore");
        return Ok(false);
    };
    store.replace_state(Slice::from_value(state))?;
    debug!(store = %store.name(), "state restored");
    Ok(true)
}

/// Save the current state of `store` to `persistor`.
pub fn save(store: &Store, persistor: &dyn StatePersistor) -> PersistResult<()> {
    persistor.save(&store.state().to_value())
}

/// Restore `store` from `persistor`, then save after every notification.
///
/// Saves run inside the notification pass, where errors cannot reach the
/// caller; they are logged and the next notification tries again. The
/// returned subscription ends the syncing.
pub fn attach(store: &Store, persistor: Rc<dyn StatePersistor>) -> PersistResult<Subscription> {
    restore(store, persistor.as_ref())?;
    let weak = store.downgrade();
    let subscription = store.subscribe(move |notification| {
        let Some(store) = weak.upgrade() else {
            return;
        };
        if let Err(err) = save(&store, persistor.as_ref()) {
            warn!(
                store = %store.name(),
                path = %notification.path,
                error = %err,
                "failed to persist state"
            );
        }
    });
    Ok(subscription)
}

#[cfg(test)]
mod tests {
    use arbor_module::ModuleDescriptor;
    use arbor_types::DispatchError;
    use serde_json::json;

    use super::*;
    use crate::error::PersistError;
    use crate::file::JsonFilePersistor;
    use crate::memory::MemoryPersistor;

    fn store() -> Store {
        let counter = ModuleDescriptor::new().state(0).reducer("inc", |state, _| {
            Some(Slice::from(state.as_i64()? + 1))
        });
        Store::new(ModuleDescriptor::new().module("counter", counter)).unwrap()
    }

    #[test]
    fn restore_without_snapshot_keeps_initial_state() {
        let store = store();
        assert!(!restore(&store, &MemoryPersistor::new()).unwrap());
        assert_eq!(store.state(), json!({ "counter": 0 }));
    }

    #[test]
    fn restore_replaces_state() {
        let store = store();
        let p = MemoryPersistor::with_snapshot(json!({ "counter": 41 }));
        assert!(restore(&store, &p).unwrap());
        store.commit("counter/inc", &[]).unwrap();
        assert_eq!(store.get("counter").unwrap().as_i64(), Some(42));
    }

    #[test]
    fn mismatched_snapshots_are_rejected() {
        let store = store();
        let p = MemoryPersistor::with_snapshot(json!({ "counter": { "n": 1 } }));
        let err = restore(&store, &p).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Store(DispatchError::KindMismatch { .. })
        ));
        assert_eq!(store.state(), json!({ "counter": 0 }));
    }

    #[test]
    fn attached_persistor_saves_every_change() {
        let store = store();
        let p = Rc::new(MemoryPersistor::new());
        let subscription = attach(&store, p.clone()).unwrap();

        store.commit("counter/inc", &[]).unwrap();
        store.commit("counter/inc", &[]).unwrap();
        assert_eq!(p.snapshot(), Some(json!({ "counter": 2 })));
        assert_eq!(p.saves(), 2);

        subscription.unsubscribe();
        store.commit("counter/inc", &[]).unwrap();
        assert_eq!(p.saves(), 2);
    }

    #[test]
    fn state_survives_a_restart_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        {
            let store = store();
            attach(&store, Rc::new(JsonFilePersistor::new(&path))).unwrap();
            store.commit("counter/inc", &[]).unwrap();
            store.commit("counter/inc", &[]).unwrap();
        }

        let store = store();
        attach(&store, Rc::new(JsonFilePersistor::new(&path))).unwrap();
        assert_eq!(store.get("counter").unwrap().as_i64(), Some(2));
    }
}
