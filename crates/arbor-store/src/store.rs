//! The store handle and its runtime protocol.
//!
//! A mutation runs synchronously in the caller's stack:
//!
//! 1. the reducer sees the current slice and the call arguments;
//! 2. `None`, or a result that is [`same`](Slice::same) as the prior slice,
//!    ends the call as a no-op (no flag, no listeners, no notification);
//! 3. otherwise the result is settled by the node's [`Propagation`] and
//!    written into the host, renewing every ancestor;
//! 4. the change flag is set, listeners on the node's path fire in
//!    declaration order, and one notification goes out unless an outer
//!    stage is open.

use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use arbor_bus::SubscriptionId;
use arbor_module::error::module_label;
use arbor_module::{ActionContext, ActionResult, ListenerContext, ModuleDescriptor, Reducer};
use arbor_types::{
    BatchEntry, DispatchError, ModulePath, Notification, Slice, SliceKind, Trigger, Value,
};
use tracing::{debug, info, trace};

use crate::batch::Batch;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::host::{Host, Mount};
use crate::install::{check_listeners, check_selectors, Installed, Installer};
use crate::node::{ActNode, MutateNode, ReadNode, SelectNode};
use crate::propagation::Propagation;
use crate::router::ListenerRouter;
use crate::scope::Scope;
use crate::tree::AccessTree;

// ---------------------------------------------------------------------------
// StoreLink
// ---------------------------------------------------------------------------

/// Late-bound, non-owning reference from a node to its store.
///
/// Nodes are built before the store that owns them exists; the link is
/// filled in once, right after the store is allocated.
#[derive(Clone, Default)]
pub(crate) struct StoreLink(Rc<OnceCell<Weak<StoreInner>>>);

impl StoreLink {
    pub(crate) fn bind(&self, inner: &Rc<StoreInner>) {
        let _ = self.0.set(Rc::downgrade(inner));
    }

    pub(crate) fn store(&self) -> Option<Store> {
        let inner = self.0.get()?.upgrade()?;
        Some(Store { inner })
    }
}

// ---------------------------------------------------------------------------
// StoreInner
// ---------------------------------------------------------------------------

pub(crate) struct StoreInner {
    pub(crate) config: StoreConfig,
    pub(crate) mount: RefCell<Mount>,
    pub(crate) read: AccessTree<Rc<ReadNode>>,
    pub(crate) mutate: AccessTree<Rc<MutateNode>>,
    pub(crate) act: AccessTree<Rc<ActNode>>,
    pub(crate) select: AccessTree<Rc<SelectNode>>,
    pub(crate) router: ListenerRouter,
    pub(crate) modules: BTreeMap<ModulePath, SliceKind>,
    /// Stores combined into this one, keyed by name. Held strongly so an
    /// aggregate keeps its members' nodes alive.
    pub(crate) members: Vec<(String, Store)>,
    pub(crate) batch: RefCell<Vec<BatchEntry>>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A handle to an installed store. Clones share the same store.
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Rc<StoreInner>,
}

impl Store {
    /// Install `descriptor` with the default configuration.
    pub fn new(descriptor: ModuleDescriptor) -> StoreResult<Self> {
        Self::with_config(descriptor, StoreConfig::default())
    }

    pub fn with_config(descriptor: ModuleDescriptor, config: StoreConfig) -> StoreResult<Self> {
        let link = StoreLink::default();
        let mut installer = Installer::new(&link);
        let Installed {
            state,
            read,
            mutate,
            act,
            select,
        } = installer.install(descriptor, &ModulePath::root(), config.enhance)?;
        let catalog = installer.finish();

        check_listeners(&catalog.router, &mutate, &act, &config)?;
        check_selectors(&catalog.selectors, &read, &select, &config)?;

        info!(
            store = %config.name,
            modules = catalog.modules.len(),
            listeners = catalog.router.len(),
            "store installed"
        );
        let inner = Rc::new(StoreInner {
            config,
            mount: RefCell::new(Mount::standalone(Host::new(state))),
            read,
            mutate,
            act,
            select,
            router: catalog.router,
            modules: catalog.modules,
            members: Vec::new(),
            batch: RefCell::new(Vec::new()),
        });
        link.bind(&inner);
        Ok(Self { inner })
    }

    pub(crate) fn from_inner(inner: Rc<StoreInner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub(crate) fn mount(&self) -> Mount {
        self.inner.mount.borrow().clone()
    }

    fn host(&self) -> Rc<Host> {
        Rc::clone(&self.inner.mount.borrow().host)
    }

    /// Whether two handles refer to the same store.
    pub fn ptr_eq(a: &Store, b: &Store) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// A non-owning handle, for callbacks the store itself keeps alive.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore(Rc::downgrade(&self.inner))
    }

    // -- trees --------------------------------------------------------------

    pub fn read(&self) -> &AccessTree<Rc<ReadNode>> {
        &self.inner.read
    }

    pub fn mutate(&self) -> &AccessTree<Rc<MutateNode>> {
        &self.inner.mutate
    }

    pub fn act(&self) -> &AccessTree<Rc<ActNode>> {
        &self.inner.act
    }

    pub fn select_tree(&self) -> &AccessTree<Rc<SelectNode>> {
        &self.inner.select
    }

    /// Installed modules and their fixed slice kinds.
    pub fn modules(&self) -> impl Iterator<Item = (&ModulePath, SliceKind)> {
        self.inner.modules.iter().map(|(path, kind)| (path, *kind))
    }

    /// Names of the stores combined into this one.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.inner.members.iter().map(|(name, _)| name.as_str())
    }

    pub fn member(&self, name: &str) -> Option<&Store> {
        self.inner
            .members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, store)| store)
    }

    /// Whether this store has been mounted into an aggregate.
    pub fn is_mounted(&self) -> bool {
        !self.inner.mount.borrow().is_standalone()
    }

    // -- reading ------------------------------------------------------------

    /// The whole state of this store.
    pub fn state(&self) -> Slice {
        self.mount().state()
    }

    /// Read through the read tree: a module, a state key, or a getter.
    pub fn get(&self, path: &str) -> Option<Slice> {
        self.get_path(&parse_or_trace(path)?)
    }

    pub(crate) fn get_path(&self, path: &ModulePath) -> Option<Slice> {
        match self.inner.read.resolve(path.segments()) {
            Some(node) => node.get(),
            None => {
                trace!(store = %self.name(), %path, "read path does not resolve");
                None
            }
        }
    }

    /// Evaluate a memoized selector.
    pub fn select(&self, path: &str, args: &[Value]) -> Option<Slice> {
        self.select_path(&parse_or_trace(path)?, args)
    }

    pub(crate) fn select_path(&self, path: &ModulePath, args: &[Value]) -> Option<Slice> {
        match self.inner.select.resolve(path.segments()) {
            Some(node) => node.select(args),
            None => {
                trace!(store = %self.name(), %path, "select path does not resolve");
                None
            }
        }
    }

    /// How many times the selector at `path` has recomputed.
    pub fn recomputations(&self, path: &str) -> Option<u64> {
        let path = ModulePath::parse(path).ok()?;
        self.inner
            .select
            .resolve(path.segments())
            .map(|node| node.recomputations())
    }

    /// A selector input: a read path first, then a select path evaluated
    /// without arguments. Anything else reads as `null`.
    pub(crate) fn resolve_input(&self, path: &ModulePath) -> Slice {
        if let Some(node) = self.inner.read.resolve(path.segments()) {
            return node.get().unwrap_or_default();
        }
        if let Some(node) = self.inner.select.resolve(path.segments()) {
            return node.select(&[]).unwrap_or_default();
        }
        Slice::null()
    }

    // -- mutating -----------------------------------------------------------

    /// Invoke the mutate node at `path`.
    ///
    /// Unknown paths are a no-op returning `Ok(None)`. `<module>/push`
    /// pushes `args[0]` into the module when the module declares no reducer
    /// of that name.
    pub fn commit(&self, path: &str, args: &[Value]) -> Result<Option<Slice>, DispatchError> {
        self.commit_path(&ModulePath::parse(path)?, args)
    }

    pub(crate) fn commit_path(
        &self,
        path: &ModulePath,
        args: &[Value],
    ) -> Result<Option<Slice>, DispatchError> {
        if let Some(node) = self.inner.mutate.resolve(path.segments()) {
            return node.call(args);
        }
        if path.last() == Some("push") {
            if let Some(module) = path.parent() {
                if self.inner.modules.contains_key(&module) {
                    return match args.first() {
                        Some(value) => self.push_path(&module, Slice::from_value(value.clone())),
                        None => Ok(None),
                    };
                }
            }
        }
        trace!(store = %self.name(), %path, "commit path does not resolve");
        Ok(None)
    }

    /// Invoke the act node at `path`. Unknown paths are a no-op.
    pub fn dispatch(&self, path: &str, args: &[Value]) -> ActionResult {
        self.dispatch_path(&ModulePath::parse(path)?, args)
    }

    pub(crate) fn dispatch_path(&self, path: &ModulePath, args: &[Value]) -> ActionResult {
        match self.inner.act.resolve(path.segments()) {
            Some(node) => node.call(args),
            None => {
                trace!(store = %self.name(), %path, "dispatch path does not resolve");
                Ok(None)
            }
        }
    }

    /// Push `change` into the module at `module` through the generic push
    /// mutation: shallow merge for structured slices, replacement for
    /// primitive ones.
    pub fn push(&self, module: &str, change: Slice) -> Result<Option<Slice>, DispatchError> {
        self.push_path(&ModulePath::parse(module)?, change)
    }

    pub(crate) fn push_path(
        &self,
        module: &ModulePath,
        change: Slice,
    ) -> Result<Option<Slice>, DispatchError> {
        let Some(&kind) = self.inner.modules.get(module) else {
            return Err(DispatchError::UnknownPath {
                path: module.to_string(),
            });
        };
        let submodules = self
            .inner
            .modules
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == Some(module))
            .filter_map(|(path, &kind)| Some((path.last()?.to_string(), kind)));
        let propagation =
            Propagation::new(module.segments().to_vec(), kind).with_modules(submodules);
        let mount = self.mount();
        let prior = read_slice(&mount, propagation.path())?;
        if change.same(&prior) {
            trace!(store = %self.name(), module = %module_label(module), "push is a no-op");
            return Ok(None);
        }
        let args = [change.to_value()];
        let next = propagation.settle(&prior, change)?;
        mount.write(propagation.path(), next.clone())?;

        let notifier = mount.host.notifier();
        notifier.mark_changed();
        let path = module.join("push");
        debug!(store = %self.name(), %path, "state changed");
        notifier.notify(&Notification::new(
            mount.qualify(&path.to_string()),
            &args,
            Trigger::Reducer,
        ));
        Ok(Some(next))
    }

    pub(crate) fn apply_reducer(
        &self,
        node: &MutateNode,
        reducer: &Reducer,
        args: &[Value],
    ) -> Result<Option<Slice>, DispatchError> {
        let propagation = node.propagation();
        let mount = self.mount();
        let prior = read_slice(&mount, propagation.path())?;
        let Some(result) = reducer.apply(&prior, args) else {
            trace!(store = %self.name(), path = %node.path(), "reducer returned no change");
            return Ok(None);
        };
        if result.same(&prior) {
            trace!(store = %self.name(), path = %node.path(), "reducer returned its input");
            return Ok(None);
        }
        let next = propagation.settle(&prior, result)?;
        mount.write(propagation.path(), next.clone())?;
        mount.host.notifier().mark_changed();
        debug!(store = %self.name(), path = %node.path(), "state changed");

        self.react(node.module(), node.path(), args, Trigger::Reducer)?;
        Ok(Some(next))
    }

    pub(crate) fn run_action(&self, node: &ActNode, args: &[Value]) -> ActionResult {
        let host = self.host();
        let owned = host.notifier().stage();

        let scope = Scope::new(self.clone(), node.module().clone());
        let mut outcome = node.action().apply(&scope, args);
        if node.auto_apply() {
            if let Ok(Some(value)) = &outcome {
                if let Err(err) = scope.push(Slice::from_value(value.clone())) {
                    outcome = Err(err);
                }
            }
        }

        let fired = self.fire_listeners(node.module(), node.path(), args);
        if owned {
            self.close_stage(node.path(), args, Trigger::Action);
        }
        fired?;
        outcome
    }

    /// Fire listeners for a completed mutation, then notify unless an
    /// outer stage is open. Pushes made by listeners fold into the same
    /// notification.
    fn react(
        &self,
        module: &ModulePath,
        path: &ModulePath,
        args: &[Value],
        trigger: Trigger,
    ) -> Result<(), DispatchError> {
        let owned = self.host().notifier().stage();
        let fired = self.fire_listeners(module, path, args);
        if owned {
            self.close_stage(path, args, trigger);
        }
        fired
    }

    fn close_stage(&self, path: &ModulePath, args: &[Value], trigger: Trigger) -> bool {
        let mount = self.mount();
        let notification = Notification::new(mount.qualify(&path.to_string()), args, trigger);
        mount.host.notifier().stage_push(&notification)
    }

    fn fire_listeners(
        &self,
        target_module: &ModulePath,
        path: &ModulePath,
        args: &[Value],
    ) -> Result<(), DispatchError> {
        for route in self.inner.router.routes(path) {
            // Re-read per handler so each one sees its predecessors' pushes.
            let root = self.state();
            let context = ListenerContext {
                module: route.context.clone(),
                state: root
                    .lookup(route.context.segments())
                    .cloned()
                    .unwrap_or_default(),
                root: root.clone(),
            };
            let target = root
                .lookup(target_module.segments())
                .cloned()
                .unwrap_or_default();
            trace!(
                store = %self.name(),
                target = %path,
                context = %module_label(&route.context),
                "listener fired"
            );
            if let Some(change) = route.listener.apply(&context, &target, args) {
                self.push_path(&route.context, change)?;
            }
        }
        Ok(())
    }

    /// Resolve a queued entry: mutate tree first, then act tree. Anything
    /// else is skipped.
    pub(crate) fn invoke(&self, path: &str, args: &[Value]) -> Result<(), DispatchError> {
        let Some(parsed) = parse_or_trace(path) else {
            return Ok(());
        };
        if let Some(node) = self.inner.mutate.resolve(parsed.segments()) {
            node.call(args)?;
        } else if let Some(node) = self.inner.act.resolve(parsed.segments()) {
            node.call(args)?;
        } else {
            trace!(store = %self.name(), %path, "batch entry does not resolve");
        }
        Ok(())
    }

    // -- whole-state entry points --------------------------------------------

    /// Replace the whole state of this store.
    ///
    /// Every installed module must still be present with its slice kind.
    /// Subscribers are notified with [`Trigger::Replace`].
    pub fn replace_state(&self, state: Slice) -> Result<(), DispatchError> {
        for (path, kind) in &self.inner.modules {
            match state.lookup(path.segments()).map(Slice::kind) {
                Some(found) if found == *kind => {}
                Some(found) => {
                    return Err(DispatchError::KindMismatch {
                        path: path.to_string(),
                        expected: *kind,
                        found,
                    })
                }
                None => {
                    return Err(DispatchError::UnknownPath {
                        path: path.to_string(),
                    })
                }
            }
        }
        let mount = self.mount();
        if Slice::ptr_eq(&state, &mount.state()) {
            return Ok(());
        }
        mount.write(&[], state)?;
        let notifier = mount.host.notifier();
        notifier.mark_changed();
        debug!(store = %self.name(), "state replaced");
        notifier.notify(&Notification::new(mount.qualify(""), &[], Trigger::Replace));
        Ok(())
    }

    /// Swap the reducer behind an existing mutate node.
    pub fn replace_reducer(&self, path: &str, reducer: Reducer) -> Result<(), DispatchError> {
        let parsed = ModulePath::parse(path)?;
        let node = self
            .inner
            .mutate
            .resolve(parsed.segments())
            .ok_or_else(|| DispatchError::UnknownPath {
                path: path.to_string(),
            })?;
        node.replace(reducer);
        debug!(store = %self.name(), %path, "reducer replaced");
        Ok(())
    }

    // -- notification ---------------------------------------------------------

    /// Register a subscriber for every later notification of this store.
    pub fn subscribe(&self, listener: impl Fn(&Notification) + 'static) -> Subscription {
        let id = self.host().notifier().registry().subscribe(listener);
        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Remove a subscriber; `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.host().notifier().registry().unsubscribe(id)
    }

    /// Enter the staging state. Returns `true` if this call opened the
    /// stage; staging is idempotent.
    pub fn stage(&self) -> bool {
        self.host().notifier().stage()
    }

    pub fn is_staging(&self) -> bool {
        self.host().notifier().is_staging()
    }

    /// Leave the staging state, notifying once with `path` and `args` if
    /// anything changed since [`stage`](Self::stage). A no-op when not
    /// staging. Returns whether subscribers were notified.
    pub fn stage_push(&self, path: &str, args: &[Value]) -> bool {
        let is_action = ModulePath::parse(path)
            .ok()
            .is_some_and(|p| self.inner.act.resolve(p.segments()).is_some());
        let trigger = if is_action {
            Trigger::Action
        } else {
            Trigger::Reducer
        };
        let mount = self.mount();
        mount
            .host
            .notifier()
            .stage_push(&Notification::new(mount.qualify(path), args, trigger))
    }

    /// The batch queue of this store.
    pub fn batch(&self) -> Batch<'_> {
        Batch::new(self)
    }

    /// A scoped handle onto `module`, the same kind actions receive.
    pub fn scope(&self, module: &str) -> Result<Scope, DispatchError> {
        let path = ModulePath::parse(module)?;
        if !self.inner.modules.contains_key(&path) {
            return Err(DispatchError::UnknownPath {
                path: module.to_string(),
            });
        }
        Ok(Scope::new(self.clone(), path))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name())
            .field("modules", &self.inner.modules.len())
            .field("members", &self.inner.members.len())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

fn parse_or_trace(path: &str) -> Option<ModulePath> {
    match ModulePath::parse(path) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            trace!(%path, %err, "malformed path");
            None
        }
    }
}

fn read_slice(mount: &Mount, path: &[String]) -> Result<Slice, DispatchError> {
    mount.read(path).ok_or_else(|| DispatchError::UnknownPath {
        path: path.join("/"),
    })
}

/// A non-owning [`Store`] handle.
#[derive(Clone, Debug)]
pub struct WeakStore(Weak<StoreInner>);

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.0.upgrade().map(Store::from_inner)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Returned by [`Store::subscribe`]. Dropping it keeps the subscription;
/// call [`unsubscribe`](Self::unsubscribe) to end it.
#[derive(Clone, Debug)]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// End the subscription. Safe to call repeatedly, and from inside a
    /// notification pass.
    pub fn unsubscribe(&self) -> bool {
        match self.store.upgrade() {
            Some(inner) => Store::from_inner(inner).unsubscribe(self.id),
            None => false,
        }
    }
}
