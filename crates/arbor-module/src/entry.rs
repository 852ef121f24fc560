//! Callable descriptor entries.
//!
//! Each wrapper holds an `Rc` so descriptors and the trees built from them
//! can share the same closure.

use std::fmt;
use std::rc::Rc;

use arbor_types::{DispatchError, ModulePath, Slice, Value};

use crate::context::{ActionContext, ListenerContext};
use crate::descriptor::ModuleDescriptor;
use crate::error::ConfigError;

/// What an action returns: an optional value, or a failure.
pub type ActionResult = Result<Option<Value>, DispatchError>;

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// A pure state transition. Returning `None` means "no change".
#[derive(Clone)]
pub struct Reducer(Rc<dyn Fn(&Slice, &[Value]) -> Option<Slice>>);

impl Reducer {
    pub fn new(f: impl Fn(&Slice, &[Value]) -> Option<Slice> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, state: &Slice, args: &[Value]) -> Option<Slice> {
        (self.0)(state, args)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer(..)")
    }
}

/// A reducer, or a group of reducers operating on one key of the module
/// state.
#[derive(Clone, Debug)]
pub enum ReducerEntry {
    Leaf(Reducer),
    Nested(ReducerGroup),
}

/// Named reducers that operate on a single state key.
#[derive(Clone, Debug, Default)]
pub struct ReducerGroup {
    pub entries: Vec<(String, ReducerEntry)>,
}

impl ReducerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reducer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Slice, &[Value]) -> Option<Slice> + 'static,
    ) -> Self {
        self.entries
            .push((name.into(), ReducerEntry::Leaf(Reducer::new(f))));
        self
    }

    pub fn group(mut self, name: impl Into<String>, group: ReducerGroup) -> Self {
        self.entries.push((name.into(), ReducerEntry::Nested(group)));
        self
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An orchestration function run against a scoped store handle.
#[derive(Clone)]
pub struct Action(Rc<dyn Fn(&dyn ActionContext, &[Value]) -> ActionResult>);

impl Action {
    pub fn new(f: impl Fn(&dyn ActionContext, &[Value]) -> ActionResult + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, ctx: &dyn ActionContext, args: &[Value]) -> ActionResult {
        (self.0)(ctx, args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

// ---------------------------------------------------------------------------
// Getter / Selector
// ---------------------------------------------------------------------------

/// A pure derivation over the module's raw slice.
#[derive(Clone)]
pub struct Getter(Rc<dyn Fn(&Slice) -> Slice>);

impl Getter {
    pub fn new(f: impl Fn(&Slice) -> Slice + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, state: &Slice) -> Slice {
        (self.0)(state)
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Getter(..)")
    }
}

/// A memoized derivation over other accessors.
///
/// `inputs` are read or select paths relative to the declaring module, or
/// absolute from the store root when prefixed with `/`. The computation
/// reruns only when an input changes identity or the call arguments differ.
#[derive(Clone)]
pub struct Selector {
    inputs: Vec<String>,
    compute: Rc<dyn Fn(&[Slice], &[Value]) -> Slice>,
}

impl Selector {
    pub fn new<I, S>(inputs: I, compute: impl Fn(&[Slice], &[Value]) -> Slice + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            compute: Rc::new(compute),
        }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn compute(&self, inputs: &[Slice], args: &[Value]) -> Slice {
        (self.compute)(inputs, args)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A reaction to another module's reducer or action.
///
/// Receives the declaring module's snapshot, the target module's updated
/// slice, and the target call's arguments. A `Some` result is pushed into
/// the declaring module.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&ListenerContext, &Slice, &[Value]) -> Option<Slice>>);

impl Listener {
    pub fn new(f: impl Fn(&ListenerContext, &Slice, &[Value]) -> Option<Slice> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, ctx: &ListenerContext, target: &Slice, args: &[Value]) -> Option<Slice> {
        (self.0)(ctx, target, args)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Listener(..)")
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

type PluginFn = dyn Fn(&ModulePath, &mut ModuleDescriptor) -> Result<(), String>;

/// A pre-processing hook with write access to a descriptor, run right
/// before that descriptor is installed.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    hook: Rc<PluginFn>,
}

impl Plugin {
    pub fn new(
        name: impl Into<String>,
        hook: impl Fn(&ModulePath, &mut ModuleDescriptor) -> Result<(), String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            hook: Rc::new(hook),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the hook, mapping a rejection into a [`ConfigError::Plugin`].
    pub fn run(&self, module: &ModulePath, descriptor: &mut ModuleDescriptor) -> Result<(), ConfigError> {
        (self.hook)(module, descriptor).map_err(|message| ConfigError::Plugin {
            module: crate::error::module_label(module),
            plugin: self.name.clone(),
            message,
        })
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name).finish()
    }
}
