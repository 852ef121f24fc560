use std::collections::BTreeSet;

use arbor_types::{ModulePath, Slice, Value};

use crate::context::{ActionContext, ListenerContext};
use crate::enhance::Enhance;
use crate::entry::{
    Action, ActionResult, Getter, Listener, Plugin, Reducer, ReducerEntry, ReducerGroup, Selector,
};
use crate::error::{module_label, ConfigError};
use crate::names::{validate_name, validate_reducer_name};

// ---------------------------------------------------------------------------
// ModuleDescriptor
// ---------------------------------------------------------------------------

/// Declarative configuration of one module and, recursively, its children.
///
/// Entries are kept in declaration order; that order decides listener
/// firing order. Fields are public so plugins can rewrite a descriptor
/// before it is installed.
#[derive(Clone, Debug, Default)]
pub struct ModuleDescriptor {
    /// Initial slice. `None` installs an empty structured slice.
    pub state: Option<Value>,
    pub reducers: Vec<(String, ReducerEntry)>,
    pub actions: Vec<(String, Action)>,
    pub getters: Vec<(String, Getter)>,
    pub selectors: Vec<(String, Selector)>,
    /// Keyed by `<module>/<reducer-or-action>`, relative to the store root.
    pub listeners: Vec<(String, Listener)>,
    pub modules: Vec<(String, ModuleDescriptor)>,
    /// Behavior flags; inherited from the parent when `None`.
    pub enhance: Option<Enhance>,
    pub plugins: Vec<Plugin>,
}

impl ModuleDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: impl Into<Value>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn reducer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Slice, &[Value]) -> Option<Slice> + 'static,
    ) -> Self {
        self.reducers
            .push((name.into(), ReducerEntry::Leaf(Reducer::new(f))));
        self
    }

    /// Reducers that operate on the state key `key`.
    pub fn reducer_group(mut self, key: impl Into<String>, group: ReducerGroup) -> Self {
        self.reducers.push((key.into(), ReducerEntry::Nested(group)));
        self
    }

    pub fn action(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&dyn ActionContext, &[Value]) -> ActionResult + 'static,
    ) -> Self {
        self.actions.push((name.into(), Action::new(f)));
        self
    }

    pub fn getter(mut self, name: impl Into<String>, f: impl Fn(&Slice) -> Slice + 'static) -> Self {
        self.getters.push((name.into(), Getter::new(f)));
        self
    }

    pub fn selector(mut self, name: impl Into<String>, selector: Selector) -> Self {
        self.selectors.push((name.into(), selector));
        self
    }

    pub fn listener(
        mut self,
        target: impl Into<String>,
        f: impl Fn(&ListenerContext, &Slice, &[Value]) -> Option<Slice> + 'static,
    ) -> Self {
        self.listeners.push((target.into(), Listener::new(f)));
        self
    }

    pub fn module(mut self, name: impl Into<String>, descriptor: ModuleDescriptor) -> Self {
        self.modules.push((name.into(), descriptor));
        self
    }

    pub fn enhance(mut self, flags: Enhance) -> Self {
        self.enhance = Some(flags);
        self
    }

    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// The slice this module starts with, before sub-modules are mounted.
    pub fn initial_slice(&self) -> Slice {
        match &self.state {
            Some(value) => Slice::from_value(value.clone()),
            None => Slice::empty(),
        }
    }

    /// Check this module's own entries (not its children) for naming,
    /// collision, and kind problems.
    pub fn validate(&self, path: &ModulePath) -> Result<(), ConfigError> {
        let initial = self.initial_slice();

        let modules = collect_names(path, "module", names_of(&self.modules), validate_name)?;
        let reducers =
            collect_names(path, "reducer", names_of(&self.reducers), validate_reducer_name)?;
        let actions = collect_names(path, "action", names_of(&self.actions), validate_name)?;
        let getters = collect_names(path, "getter", names_of(&self.getters), validate_name)?;
        let selectors = collect_names(path, "selector", names_of(&self.selectors), validate_name)?;
        let state_keys = collect_names(path, "state key", initial.keys(), validate_name)?;

        for (target, _) in &self.listeners {
            let parsed = ModulePath::parse(target).map_err(|e| ConfigError::InvalidName {
                module: module_label(path),
                name: target.clone(),
                reason: e.to_string(),
            })?;
            if parsed.is_root() {
                return Err(ConfigError::InvalidName {
                    module: module_label(path),
                    name: target.clone(),
                    reason: "listener target must name a reducer or action".into(),
                });
            }
        }

        if !initial.is_structured() && !self.modules.is_empty() {
            return Err(ConfigError::KindMismatch {
                module: module_label(path),
                reason: "primitive state cannot host sub-modules".into(),
            });
        }

        ensure_disjoint(path, &modules, "sub-module", &state_keys, "state key")?;
        ensure_disjoint(path, &modules, "sub-module", &getters, "getter")?;
        ensure_disjoint(path, &modules, "sub-module", &reducers, "reducer")?;
        ensure_disjoint(path, &modules, "sub-module", &actions, "action")?;
        ensure_disjoint(path, &modules, "sub-module", &selectors, "selector")?;
        ensure_disjoint(path, &state_keys, "state key", &getters, "getter")?;

        for (key, entry) in &self.reducers {
            if let ReducerEntry::Nested(group) = entry {
                validate_group(path, &initial, key, group)?;
            }
        }
        Ok(())
    }
}

fn names_of<T>(entries: &[(String, T)]) -> impl Iterator<Item = &str> {
    entries.iter().map(|(name, _)| name.as_str())
}

fn collect_names<'a>(
    path: &ModulePath,
    category: &'static str,
    names: impl Iterator<Item = &'a str>,
    rule: fn(&ModulePath, &str) -> Result<(), ConfigError>,
) -> Result<BTreeSet<&'a str>, ConfigError> {
    let mut seen = BTreeSet::new();
    for name in names {
        rule(path, name)?;
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate {
                module: module_label(path),
                category,
                name: name.to_string(),
            });
        }
    }
    Ok(seen)
}

fn ensure_disjoint(
    path: &ModulePath,
    a: &BTreeSet<&str>,
    first: &'static str,
    b: &BTreeSet<&str>,
    second: &'static str,
) -> Result<(), ConfigError> {
    match a.intersection(b).next() {
        Some(name) => Err(ConfigError::NameCollision {
            module: module_label(path),
            name: name.to_string(),
            first,
            second,
        }),
        None => Ok(()),
    }
}

fn validate_group(
    path: &ModulePath,
    parent: &Slice,
    key: &str,
    group: &ReducerGroup,
) -> Result<(), ConfigError> {
    if !parent.is_structured() {
        return Err(ConfigError::KindMismatch {
            module: module_label(path),
            reason: format!("reducer group '{key}' targets a primitive slice"),
        });
    }
    let Some(slice) = parent.get(key) else {
        return Err(ConfigError::UnknownStateKey {
            module: module_label(path),
            key: key.to_string(),
        });
    };
    collect_names(path, "reducer", names_of(&group.entries), validate_reducer_name)?;
    for (name, entry) in &group.entries {
        if let ReducerEntry::Nested(inner) = entry {
            validate_group(path, slice, name, inner)?;
        }
    }
    Ok(())
}
