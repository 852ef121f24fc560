//! Arbor: hierarchical reactive state containers.
//!
//! An application describes its state as a tree of modules. Each module
//! owns a slice of state and declares reducers that compute new slices,
//! actions that orchestrate reducers, getters and memoized selectors that
//! derive values, and listeners that react to other modules' changes.
//! Installing the tree yields a [`Store`] with four access trees of the
//! same shape (read, mutate, act, and select) and a subscription channel that
//! fires once per external call.
//!
//! ```
//! use arbor::{json, ModuleDescriptor, Slice, Store};
//!
//! let counter = ModuleDescriptor::new().state(0).reducer("inc", |state, _| {
//!     Some(Slice::from(state.as_i64()? + 1))
//! });
//! let store = Store::new(ModuleDescriptor::new().module("counter", counter)).unwrap();
//!
//! store.commit("counter/inc", &[]).unwrap();
//! assert_eq!(store.state(), json!({ "counter": 1 }));
//! ```
//!
//! Independent stores compose with [`Store::combine`]; handles taken before
//! composition keep working against the aggregate state. State can be
//! saved and restored through the [`persist`] adapters.

pub use arbor_bus::SubscriptionId;
pub use arbor_module::{
    Action, ActionContext, ActionResult, ConfigError, Enhance, Getter, Listener, ListenerContext,
    ModuleDescriptor, Plugin, Reducer, ReducerGroup, Selector,
};
pub use arbor_store::{
    AccessTree, ActNode, Batch, MutateNode, ReadNode, Scope, SelectNode, Shape, Store,
    StoreConfig, StoreError, StoreResult, Subscription, WeakStore,
};
pub use arbor_types::{
    BatchEntry, DispatchError, ModulePath, Notification, Slice, SliceKind, Trigger, Value,
};
pub use serde_json::json;

/// Persistence adapters.
pub mod persist {
    pub use arbor_persist::{
        attach, restore, save, JsonFilePersistor, MemoryPersistor, PersistError, PersistResult,
        StatePersistor,
    };
}

#[cfg(test)]
mod scenarios;
