//! Store composition.
//!
//! Combining stores builds an aggregate whose state holds each member's
//! slice under the member's name and whose trees hold each member's trees
//! under the same key. Members are then mounted onto the aggregate's host:
//! their handles, nodes and scopes keep working, but read and write the
//! aggregate state and notify the aggregate's subscribers.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use arbor_module::validate_name;
use arbor_types::{ModulePath, Slice, SliceKind};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::host::{Host, Mount};
use crate::node::ReadNode;
use crate::router::ListenerRouter;
use crate::store::{Store, StoreInner, StoreLink};
use crate::tree::AccessTree;

impl Store {
    /// Combine named stores into one aggregate store.
    ///
    /// The aggregate state aliases each member's current slice. Members
    /// that are already part of an aggregate are rejected; composing a
    /// store into an aggregate it already belongs to changes nothing.
    ///
    /// ```
    /// use arbor_module::ModuleDescriptor;
    /// use arbor_store::Store;
    /// use arbor_types::Slice;
    ///
    /// let foo = Store::new(ModuleDescriptor::new().state(0).reducer("call", |s, _| {
    ///     Some(Slice::from(s.as_i64()? + 1))
    /// })).unwrap();
    /// let app = Store::combine("app", [("foo", foo.clone())]).unwrap();
    ///
    /// foo.commit("call", &[]).unwrap();
    /// assert_eq!(app.get("foo").unwrap().as_i64(), Some(1));
    /// ```
    pub fn combine<I, S>(name: impl Into<String>, members: I) -> StoreResult<Store>
    where
        I: IntoIterator<Item = (S, Store)>,
        S: Into<String>,
    {
        let name = name.into();
        let members: Vec<(String, Store)> = members
            .into_iter()
            .map(|(key, store)| (key.into(), store))
            .collect();
        check_members(&members)?;

        let root = Slice::structured(
            members
                .iter()
                .map(|(key, store)| (key.clone(), store.state())),
        );
        let host = Host::new(root);
        let link = StoreLink::default();

        let read = AccessTree::rekeyed(
            Some(Rc::new(ReadNode::slice(link.clone(), Vec::new()))),
            rekey(&members, |store| store.read().clone()),
        );
        let mutate = AccessTree::rekeyed(None, rekey(&members, |store| store.mutate().clone()));
        let act = AccessTree::rekeyed(None, rekey(&members, |store| store.act().clone()));
        let select =
            AccessTree::rekeyed(None, rekey(&members, |store| store.select_tree().clone()));

        let mut modules = BTreeMap::new();
        modules.insert(ModulePath::root(), SliceKind::Structured);
        for (key, store) in &members {
            let base = ModulePath::from_segments([key.as_str()]);
            for (path, kind) in store.modules() {
                modules.insert(base.concat(path), kind);
            }
        }

        let inner = Rc::new(StoreInner {
            config: StoreConfig::named(name.as_str()),
            mount: RefCell::new(Mount::standalone(Rc::clone(&host))),
            read,
            mutate,
            act,
            select,
            router: ListenerRouter::new(),
            modules,
            members: members.clone(),
            batch: RefCell::new(Vec::new()),
        });
        link.bind(&inner);

        for (key, store) in &members {
            store.remount(&host, vec![key.clone()]);
        }
        info!(
            store = %name,
            members = ?members.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            "stores combined"
        );
        Ok(Store::from_inner(inner))
    }

    /// Move this store, and recursively its members, onto `host` at
    /// `prefix`, taking its subscribers along. Repeating a remount is a
    /// no-op.
    fn remount(&self, host: &Rc<Host>, prefix: Vec<String>) {
        let previous = self.mount();
        if Rc::ptr_eq(&previous.host, host) && previous.prefix == prefix {
            return;
        }
        if !Rc::ptr_eq(&previous.host, host) {
            let moved = previous.host.notifier().registry().drain();
            host.notifier().registry().adopt(moved);
        }
        debug!(store = %self.name(), prefix = %prefix.join("/"), "store mounted");
        *self.inner.mount.borrow_mut() = Mount {
            host: Rc::clone(host),
            prefix: prefix.clone(),
        };
        for (key, member) in &self.inner.members {
            let mut nested = prefix.clone();
            nested.push(key.clone());
            member.remount(host, nested);
        }
    }
}

fn rekey<L>(
    members: &[(String, Store)],
    tree: impl Fn(&Store) -> AccessTree<L>,
) -> Vec<(String, AccessTree<L>)> {
    members
        .iter()
        .map(|(key, store)| (key.clone(), tree(store)))
        .collect()
}

fn check_members(members: &[(String, Store)]) -> StoreResult<()> {
    let mut names = BTreeSet::new();
    for (index, (key, store)) in members.iter().enumerate() {
        validate_name(&ModulePath::root(), key)?;
        if !names.insert(key.as_str()) {
            return Err(StoreError::Composition {
                name: key.clone(),
                reason: "member name used twice".into(),
            });
        }
        if members[..index]
            .iter()
            .any(|(_, earlier)| Store::ptr_eq(earlier, store))
        {
            return Err(StoreError::Composition {
                name: key.clone(),
                reason: "the same store is listed twice".into(),
            });
        }
        if store.is_mounted() {
            return Err(StoreError::Composition {
                name: key.clone(),
                reason: "store already belongs to an aggregate".into(),
            });
        }
    }
    Ok(())
}
