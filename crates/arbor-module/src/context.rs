use arbor_types::{DispatchError, ModulePath, Slice, Value};

/// The scoped store handle an action receives.
///
/// Paths are relative to the action's own module unless they start with `/`,
/// in which case they are resolved from the store root. Unresolvable paths
/// behave as no-ops, exactly as they do on the store itself.
///
/// The trait is object-safe so actions can be stored as
/// `Fn(&dyn ActionContext, &[Value])`.
pub trait ActionContext {
    /// Path of the module this handle is scoped to.
    fn module(&self) -> &ModulePath;

    /// Current slice of the scoped module.
    fn state(&self) -> Slice;

    /// Current state of the whole store.
    fn root_state(&self) -> Slice;

    /// Read through the read tree.
    fn get(&self, path: &str) -> Option<Slice>;

    /// Evaluate a memoized selector.
    fn select(&self, path: &str, args: &[Value]) -> Option<Slice>;

    /// Invoke a mutate node.
    fn commit(&self, path: &str, args: &[Value]) -> Result<Option<Slice>, DispatchError>;

    /// Invoke an act node.
    fn dispatch(&self, path: &str, args: &[Value]) -> Result<Option<Value>, DispatchError>;

    /// Apply `change` to the scoped module through its generic push
    /// mutation: shallow merge for structured slices, replacement otherwise.
    fn push(&self, change: Slice) -> Result<Option<Slice>, DispatchError>;

    /// An owned handle to the same scope, for continuations that outlive the
    /// action call (timers, external events).
    fn detach(&self) -> Box<dyn ActionContext>;
}

/// Read-only snapshot handed to a cross-module listener.
#[derive(Clone, Debug)]
pub struct ListenerContext {
    /// The module that declared the listener.
    pub module: ModulePath,
    /// That module's slice at the moment the listener fires.
    pub state: Slice,
    /// The whole store state at the moment the listener fires.
    pub root: Slice,
}
