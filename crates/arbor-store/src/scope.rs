use arbor_module::ActionContext;
use arbor_types::{DispatchError, ModulePath, Slice, Value};

use crate::install::resolve_relative;
use crate::store::Store;

/// A store handle scoped to one module.
///
/// Paths are relative to the module unless they start with `/`. Scopes own
/// a store handle, so a detached scope stays usable from timers and other
/// deferred continuations.
#[derive(Clone, Debug)]
pub struct Scope {
    store: Store,
    module: ModulePath,
}

impl Scope {
    pub(crate) fn new(store: Store, module: ModulePath) -> Self {
        Self { store, module }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn resolve(&self, path: &str) -> Result<ModulePath, DispatchError> {
        resolve_relative(&self.module, path)
    }
}

impl ActionContext for Scope {
    fn module(&self) -> &ModulePath {
        &self.module
    }

    fn state(&self) -> Slice {
        self.store
            .state()
            .lookup(self.module.segments())
            .cloned()
            .unwrap_or_default()
    }

    fn root_state(&self) -> Slice {
        self.store.state()
    }

    fn get(&self, path: &str) -> Option<Slice> {
        self.store.get_path(&self.resolve(path).ok()?)
    }

    fn select(&self, path: &str, args: &[Value]) -> Option<Slice> {
        self.store.select_path(&self.resolve(path).ok()?, args)
    }

    fn commit(&self, path: &str, args: &[Value]) -> Result<Option<Slice>, DispatchError> {
        self.store.commit_path(&self.resolve(path)?, args)
    }

    fn dispatch(&self, path: &str, args: &[Value]) -> Result<Option<Value>, DispatchError> {
        self.store.dispatch_path(&self.resolve(path)?, args)
    }

    fn push(&self, change: Slice) -> Result<Option<Slice>, DispatchError> {
        self.store.push_path(&self.module, change)
    }

    fn detach(&self) -> Box<dyn ActionContext> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use arbor_module::ModuleDescriptor;
    use serde_json::json;

    use super::*;

    fn store() -> Store {
        let counter = ModuleDescriptor::new().state(0).reducer("inc", |state, _| {
            Some(Slice::from(state.as_i64()? + 1))
        });
        let todos = ModuleDescriptor::new()
            .state(json!({ "items": [] }))
            .getter("count", |state| {
                let n = state.get("items").and_then(Slice::as_array).map_or(0, Vec::len);
                Slice::from(n as i64)
            });
        Store::new(
            ModuleDescriptor::new()
                .module("counter", counter)
                .module("todos", todos),
        )
        .unwrap()
    }

    #[test]
    fn relative_and_absolute_paths() {
        let store = store();
        let scope = store.scope("todos").unwrap();

        assert_eq!(scope.get("count").unwrap().as_i64(), Some(0));
        assert_eq!(scope.get("/counter").unwrap().as_i64(), Some(0));
        assert_eq!(scope.commit("/counter/inc", &[]).unwrap().unwrap().as_i64(), Some(1));
        assert!(scope.commit("inc", &[]).unwrap().is_none());
        assert!(scope.commit("a//b", &[]).is_err());
    }

    #[test]
    fn push_targets_the_scoped_module() {
        let store = store();
        let scope = store.scope("todos").unwrap();
        scope.push(Slice::from(json!({ "items": [1] }))).unwrap();
        assert_eq!(store.get("todos/items").unwrap(), json!([1]));
        assert_eq!(scope.state(), json!({ "items": [1] }));
        assert_eq!(scope.root_state(), store.state());
    }

    #[test]
    fn detached_scopes_outlive_the_call() {
        let store = store();
        let detached = store.scope("counter").unwrap().detach();
        detached.commit("inc", &[]).unwrap();
        detached.commit("inc", &[]).unwrap();
        assert_eq!(store.get("counter").unwrap().as_i64(), Some(2));
        assert_eq!(detached.module().to_string(), "counter");
    }

    #[test]
    fn unknown_modules_have_no_scope() {
        assert!(matches!(
            store().scope("missing"),
            Err(DispatchError::UnknownPath { .. })
        ));
    }
}
