//! Bound accessor nodes.
//!
//! Nodes reach their store through a [`StoreLink`] rather than a captured
//! host, so a node handed out before composition keeps working after its
//! store has been mounted into an aggregate.

use std::cell::{Cell, RefCell};
use std::fmt;

use arbor_module::{Action, ActionResult, Getter, Reducer, Selector};
use arbor_types::{DispatchError, ModulePath, Slice, Value};
use tracing::trace;

use crate::memo::Memo;
use crate::propagation::Propagation;
use crate::store::StoreLink;

// ---------------------------------------------------------------------------
// ReadNode
// ---------------------------------------------------------------------------

/// Reads a module slice, a state key, or a getter over a module slice.
pub struct ReadNode {
    link: StoreLink,
    source: Vec<String>,
    getter: Option<Getter>,
}

impl ReadNode {
    pub(crate) fn slice(link: StoreLink, source: Vec<String>) -> Self {
        Self {
            link,
            source,
            getter: None,
        }
    }

    pub(crate) fn getter(link: StoreLink, module: Vec<String>, getter: Getter) -> Self {
        Self {
            link,
            source: module,
            getter: Some(getter),
        }
    }

    pub fn get(&self) -> Option<Slice> {
        let store = self.link.store()?;
        let slice = store.mount().read(&self.source)?;
        Some(match &self.getter {
            Some(getter) => getter.apply(&slice),
            None => slice,
        })
    }

    pub fn is_getter(&self) -> bool {
        self.getter.is_some()
    }
}

impl fmt::Debug for ReadNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadNode")
            .field("source", &self.source.join("/"))
            .field("getter", &self.getter.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// MutateNode
// ---------------------------------------------------------------------------

/// Applies a reducer to its slice with propagation and change detection.
pub struct MutateNode {
    link: StoreLink,
    module: ModulePath,
    path: ModulePath,
    propagation: Propagation,
    reducer: RefCell<Reducer>,
}

impl MutateNode {
    pub(crate) fn new(
        link: StoreLink,
        module: ModulePath,
        path: ModulePath,
        propagation: Propagation,
        reducer: Reducer,
    ) -> Self {
        Self {
            link,
            module,
            path,
            propagation,
            reducer: RefCell::new(reducer),
        }
    }

    /// Run the reducer. `Ok(None)` means nothing changed (or the store is
    /// gone); `Ok(Some(slice))` carries the new value of the slice.
    pub fn call(&self, args: &[Value]) -> Result<Option<Slice>, DispatchError> {
        let Some(store) = self.link.store() else {
            return Ok(None);
        };
        // Cloned so the reducer may be replaced while it runs.
        let reducer = self.reducer.borrow().clone();
        store.apply_reducer(self, &reducer, args)
    }

    pub fn module(&self) -> &ModulePath {
        &self.module
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    pub fn propagation(&self) -> &Propagation {
        &self.propagation
    }

    pub(crate) fn replace(&self, reducer: Reducer) {
        *self.reducer.borrow_mut() = reducer;
    }
}

impl fmt::Debug for MutateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutateNode")
            .field("path", &self.path.to_string())
            .field("kind", &self.propagation.kind())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ActNode
// ---------------------------------------------------------------------------

/// Runs an action against a scope of its module.
pub struct ActNode {
    link: StoreLink,
    module: ModulePath,
    path: ModulePath,
    action: Action,
    auto_apply: bool,
}

impl ActNode {
    pub(crate) fn new(
        link: StoreLink,
        module: ModulePath,
        path: ModulePath,
        action: Action,
        auto_apply: bool,
    ) -> Self {
        Self {
            link,
            module,
            path,
            action,
            auto_apply,
        }
    }

    pub fn call(&self, args: &[Value]) -> ActionResult {
        let Some(store) = self.link.store() else {
            return Ok(None);
        };
        store.run_action(self, args)
    }

    pub fn module(&self) -> &ModulePath {
        &self.module
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    pub(crate) fn action(&self) -> &Action {
        &self.action
    }

    /// Whether a returned value is pushed into the module.
    pub fn auto_apply(&self) -> bool {
        self.auto_apply
    }
}

impl fmt::Debug for ActNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActNode")
            .field("path", &self.path.to_string())
            .field("auto_apply", &self.auto_apply)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SelectNode
// ---------------------------------------------------------------------------

/// A memoized selector over read and select paths.
pub struct SelectNode {
    link: StoreLink,
    path: ModulePath,
    selector: Selector,
    inputs: Vec<ModulePath>,
    memo: Memo,
    evaluating: Cell<bool>,
}

impl SelectNode {
    pub(crate) fn new(
        link: StoreLink,
        path: ModulePath,
        selector: Selector,
        inputs: Vec<ModulePath>,
    ) -> Self {
        Self {
            link,
            path,
            selector,
            inputs,
            memo: Memo::new(),
            evaluating: Cell::new(false),
        }
    }

    /// Evaluate with `args`. Yields `None` if the store is gone or the
    /// selector is already being evaluated further up the stack.
    pub fn select(&self, args: &[Value]) -> Option<Slice> {
        let store = self.link.store()?;
        if self.evaluating.replace(true) {
            trace!(path = %self.path, "selector re-entered through its own inputs");
            return None;
        }
        let inputs: Vec<Slice> = self
            .inputs
            .iter()
            .map(|input| store.resolve_input(input))
            .collect();
        self.evaluating.set(false);

        Some(
            self.memo
                .get_or_compute(inputs, args, |inputs, args| self.selector.compute(inputs, args)),
        )
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    /// Store-relative paths of the inputs.
    pub fn inputs(&self) -> &[ModulePath] {
        &self.inputs
    }

    pub fn recomputations(&self) -> u64 {
        self.memo.recomputations()
    }
}

impl fmt::Debug for SelectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectNode")
            .field("path", &self.path.to_string())
            .field("inputs", &self.inputs)
            .field("memo", &self.memo)
            .finish()
    }
}
