//! The node installer.
//!
//! Installation walks the descriptor tree depth first. Every module yields
//! one level in each of the four access trees, so the trees share the
//! module nesting by construction. Nothing is handed out until the whole
//! tree has installed and passed the cross-module checks, so a failure
//! leaves no partial store behind.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use arbor_module::error::module_label;
use arbor_module::{ConfigError, Enhance, ModuleDescriptor, ReducerEntry, ReducerGroup};
use arbor_types::{ModulePath, Slice, SliceKind};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::node::{ActNode, MutateNode, ReadNode, SelectNode};
use crate::propagation::Propagation;
use crate::router::{ListenerRouter, Route};
use crate::store::StoreLink;
use crate::tree::{AccessTree, Entry};

/// The four trees and the initial state of one installed module.
pub(crate) struct Installed {
    pub(crate) state: Slice,
    pub(crate) read: AccessTree<Rc<ReadNode>>,
    pub(crate) mutate: AccessTree<Rc<MutateNode>>,
    pub(crate) act: AccessTree<Rc<ActNode>>,
    pub(crate) select: AccessTree<Rc<SelectNode>>,
}

/// Store-wide results collected while installing.
pub(crate) struct Catalog {
    pub(crate) modules: BTreeMap<ModulePath, SliceKind>,
    pub(crate) router: ListenerRouter,
    pub(crate) selectors: Vec<Rc<SelectNode>>,
}

pub(crate) struct Installer<'a> {
    link: &'a StoreLink,
    catalog: Catalog,
}

impl<'a> Installer<'a> {
    pub(crate) fn new(link: &'a StoreLink) -> Self {
        Self {
            link,
            catalog: Catalog {
                modules: BTreeMap::new(),
                router: ListenerRouter::new(),
                selectors: Vec::new(),
            },
        }
    }

    pub(crate) fn finish(self) -> Catalog {
        self.catalog
    }

    /// Install `descriptor` at `path`, then its sub-modules.
    pub(crate) fn install(
        &mut self,
        mut descriptor: ModuleDescriptor,
        path: &ModulePath,
        inherited: Enhance,
    ) -> Result<Installed, ConfigError> {
        let plugins = descriptor.plugins.clone();
        for plugin in &plugins {
            plugin.run(path, &mut descriptor)?;
        }
        descriptor.validate(path)?;

        let flags = descriptor.enhance.unwrap_or(inherited);
        let initial = descriptor.initial_slice();
        let kind = initial.kind();

        let mut installed = Installed {
            state: initial.clone(),
            read: AccessTree::default(),
            mutate: AccessTree::default(),
            act: AccessTree::default(),
            select: AccessTree::default(),
        };

        let mut submodules = BTreeMap::new();
        for (name, child) in std::mem::take(&mut descriptor.modules) {
            let child_path = path.join(name.as_str());
            let sub = self.install(child, &child_path, flags)?;
            submodules.insert(name.clone(), sub.state.kind());
            installed.state = installed
                .state
                .with_key(name.as_str(), sub.state)
                .ok_or_else(|| ConfigError::KindMismatch {
                    module: module_label(path),
                    reason: "primitive state cannot host sub-modules".into(),
                })?;
            installed.read.children.insert(name.clone(), sub.read);
            installed.mutate.children.insert(name.clone(), sub.mutate);
            installed.act.children.insert(name.clone(), sub.act);
            installed.select.children.insert(name, sub.select);
        }

        self.bind_read(&mut installed.read, &descriptor, &initial, path);
        let own = Propagation::new(path.segments().to_vec(), kind).with_modules(submodules);
        self.bind_mutate(&mut installed.mutate, &descriptor, &initial, path, &own)?;
        self.bind_act(&mut installed.act, &descriptor, path, flags);
        self.bind_select(&mut installed.select, &descriptor, path)?;

        for (target, listener) in &descriptor.listeners {
            let target = ModulePath::parse(target).map_err(|e| ConfigError::InvalidName {
                module: module_label(path),
                name: target.clone(),
                reason: e.to_string(),
            })?;
            self.catalog.router.add(
                target,
                Route {
                    context: path.clone(),
                    listener: listener.clone(),
                },
            );
        }

        debug!(module = %module_label(path), %kind, "module installed");
        self.catalog.modules.insert(path.clone(), kind);
        Ok(installed)
    }

    fn bind_read(
        &self,
        tree: &mut AccessTree<Rc<ReadNode>>,
        descriptor: &ModuleDescriptor,
        initial: &Slice,
        path: &ModulePath,
    ) {
        tree.node = Some(Rc::new(ReadNode::slice(
            self.link.clone(),
            path.segments().to_vec(),
        )));
        for key in initial.keys() {
            let node = ReadNode::slice(self.link.clone(), path.join(key).segments().to_vec());
            tree.entries
                .insert(key.to_string(), Entry::Leaf(Rc::new(node)));
        }
        for (name, getter) in &descriptor.getters {
            let node = ReadNode::getter(self.link.clone(), path.segments().to_vec(), getter.clone());
            tree.entries.insert(name.clone(), Entry::Leaf(Rc::new(node)));
        }
    }

    fn bind_mutate(
        &self,
        tree: &mut AccessTree<Rc<MutateNode>>,
        descriptor: &ModuleDescriptor,
        initial: &Slice,
        path: &ModulePath,
        own: &Propagation,
    ) -> Result<(), ConfigError> {
        for (name, entry) in &descriptor.reducers {
            let bound = match entry {
                ReducerEntry::Leaf(reducer) => Entry::Leaf(Rc::new(MutateNode::new(
                    self.link.clone(),
                    path.clone(),
                    path.join(name.as_str()),
                    own.clone(),
                    reducer.clone(),
                ))),
                ReducerEntry::Nested(group) => {
                    let slice = slice_at(path, initial, name)?;
                    self.bind_group(path, &path.join(name.as_str()), slice, group)?
                }
            };
            tree.entries.insert(name.clone(), bound);
        }
        Ok(())
    }

    /// Bind a reducer group operating on the slice at `target`. Its
    /// reducers propagate into that slice, which in turn is written back
    /// under its key, renewing the module slice and every ancestor.
    fn bind_group(
        &self,
        module: &ModulePath,
        target: &ModulePath,
        slice: &Slice,
        group: &ReducerGroup,
    ) -> Result<Entry<Rc<MutateNode>>, ConfigError> {
        let propagation = Propagation::new(target.segments().to_vec(), slice.kind());
        let mut entries = BTreeMap::new();
        for (name, entry) in &group.entries {
            let bound = match entry {
                ReducerEntry::Leaf(reducer) => Entry::Leaf(Rc::new(MutateNode::new(
                    self.link.clone(),
                    module.clone(),
                    target.join(name.as_str()),
                    propagation.clone(),
                    reducer.clone(),
                ))),
                ReducerEntry::Nested(inner) => {
                    let child = slice_at(module, slice, name)?;
                    self.bind_group(module, &target.join(name.as_str()), child, inner)?
                }
            };
            entries.insert(name.clone(), bound);
        }
        Ok(Entry::Group(entries))
    }

    fn bind_act(
        &self,
        tree: &mut AccessTree<Rc<ActNode>>,
        descriptor: &ModuleDescriptor,
        path: &ModulePath,
        flags: Enhance,
    ) {
        for (name, action) in &descriptor.actions {
            let node = ActNode::new(
                self.link.clone(),
                path.clone(),
                path.join(name.as_str()),
                action.clone(),
                flags.auto_apply_actions,
            );
            tree.entries.insert(name.clone(), Entry::Leaf(Rc::new(node)));
        }
    }

    fn bind_select(
        &mut self,
        tree: &mut AccessTree<Rc<SelectNode>>,
        descriptor: &ModuleDescriptor,
        path: &ModulePath,
    ) -> Result<(), ConfigError> {
        for (name, selector) in &descriptor.selectors {
            let mut inputs = Vec::with_capacity(selector.inputs().len());
            for input in selector.inputs() {
                let resolved =
                    resolve_relative(path, input).map_err(|_| ConfigError::UnknownSelectorInput {
                        module: module_label(path),
                        selector: name.clone(),
                        input: input.clone(),
                    })?;
                inputs.push(resolved);
            }
            let node = Rc::new(SelectNode::new(
                self.link.clone(),
                path.join(name.as_str()),
                selector.clone(),
                inputs,
            ));
            self.catalog.selectors.push(Rc::clone(&node));
            tree.entries.insert(name.clone(), Entry::Leaf(node));
        }
        Ok(())
    }
}

fn slice_at<'s>(module: &ModulePath, parent: &'s Slice, key: &str) -> Result<&'s Slice, ConfigError> {
    parent.get(key).ok_or_else(|| ConfigError::UnknownStateKey {
        module: module_label(module),
        key: key.to_string(),
    })
}

/// Resolve a path written inside `module`: relative by default, absolute
/// from the store root with a leading `/`.
pub(crate) fn resolve_relative(
    module: &ModulePath,
    path: &str,
) -> Result<ModulePath, arbor_types::DispatchError> {
    match path.strip_prefix('/') {
        Some(absolute) => ModulePath::parse(absolute),
        None => Ok(module.concat(&ModulePath::parse(path)?)),
    }
}

// ---------------------------------------------------------------------------
// Cross-module checks
// ---------------------------------------------------------------------------

/// Every listener must follow a reducer or action of this store.
pub(crate) fn check_listeners(
    router: &ListenerRouter,
    mutate: &AccessTree<Rc<MutateNode>>,
    act: &AccessTree<Rc<ActNode>>,
    config: &StoreConfig,
) -> Result<(), ConfigError> {
    for (target, routes) in router.targets() {
        let segments = target.segments();
        if mutate.resolve(segments).is_some() || act.resolve(segments).is_some() {
            continue;
        }
        let module = routes
            .first()
            .map(|route| module_label(&route.context))
            .unwrap_or_default();
        if config.strict_listeners {
            return Err(ConfigError::UnknownListenerTarget {
                module,
                target: target.to_string(),
            });
        }
        warn!(store = %config.name, %module, %target, "listener target does not resolve; it will never fire");
    }
    Ok(())
}

/// Selector inputs must resolve, and must not loop back to the selector.
pub(crate) fn check_selectors(
    selectors: &[Rc<SelectNode>],
    read: &AccessTree<Rc<ReadNode>>,
    select: &AccessTree<Rc<SelectNode>>,
    config: &StoreConfig,
) -> Result<(), ConfigError> {
    // Edges between selectors only; reads win when a path names both.
    let mut edges: BTreeMap<&ModulePath, Vec<&ModulePath>> = BTreeMap::new();
    for node in selectors {
        let deps = edges.entry(node.path()).or_default();
        for input in node.inputs() {
            let segments = input.segments();
            if read.resolve(segments).is_some() {
                continue;
            }
            if let Some(dep) = select.resolve(segments) {
                deps.push(dep.path());
                continue;
            }
            let module = node.path().parent().unwrap_or_default();
            let selector = node.path().last().unwrap_or_default().to_string();
            if config.strict_selectors {
                return Err(ConfigError::UnknownSelectorInput {
                    module: module_label(&module),
                    selector,
                    input: input.to_string(),
                });
            }
            warn!(store = %config.name, %selector, %input, "selector input does not resolve; it reads as null");
        }
    }

    let mut done = BTreeSet::new();
    for start in edges.keys() {
        let mut on_stack = Vec::new();
        if let Some(path) = find_cycle(*start, &edges, &mut done, &mut on_stack) {
            if config.strict_selectors {
                return Err(ConfigError::SelectorCycle {
                    path: path.to_string(),
                });
            }
            warn!(store = %config.name, %path, "selector depends on itself; cyclic evaluations yield nothing");
        }
    }
    Ok(())
}

fn find_cycle<'p>(
    node: &'p ModulePath,
    edges: &BTreeMap<&'p ModulePath, Vec<&'p ModulePath>>,
    done: &mut BTreeSet<&'p ModulePath>,
    on_stack: &mut Vec<&'p ModulePath>,
) -> Option<&'p ModulePath> {
    if on_stack.contains(&node) {
        return Some(node);
    }
    if done.contains(node) {
        return None;
    }
    on_stack.push(node);
    for dep in edges.get(node).into_iter().flatten() {
        if let Some(found) = find_cycle(*dep, edges, done, on_stack) {
            return Some(found);
        }
    }
    on_stack.pop();
    done.insert(node);
    None
}
