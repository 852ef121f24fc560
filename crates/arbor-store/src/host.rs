//! The single-writer state cell and the mount that locates a store in it.

use std::cell::RefCell;
use std::rc::Rc;

use arbor_bus::Notifier;
use arbor_types::{DispatchError, Slice};

/// Owns a root slice and the notifier of everyone writing into it.
///
/// A standalone store has its own host. Composition creates a new host for
/// the aggregate and moves every member onto it.
#[derive(Debug)]
pub(crate) struct Host {
    root: RefCell<Slice>,
    notifier: Notifier,
}

impl Host {
    pub(crate) fn new(root: Slice) -> Rc<Self> {
        Rc::new(Self {
            root: RefCell::new(root),
            notifier: Notifier::new(),
        })
    }

    pub(crate) fn root(&self) -> Slice {
        self.root.borrow().clone()
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Swap in a new root without any bookkeeping.
    pub(crate) fn set_root(&self, root: Slice) {
        *self.root.borrow_mut() = root;
    }

    /// Replace the node at `path`, renewing every ancestor up to the root.
    pub(crate) fn write(&self, path: &[String], value: Slice) -> Result<(), DispatchError> {
        let next = self
            .root
            .borrow()
            .replace_at(path, value)
            .ok_or_else(|| DispatchError::UnknownPath {
                path: path.join("/"),
            })?;
        self.set_root(next);
        Ok(())
    }
}

/// Where a store's state lives: a host plus the key path of the store's
/// root inside it.
#[derive(Clone, Debug)]
pub(crate) struct Mount {
    pub(crate) host: Rc<Host>,
    pub(crate) prefix: Vec<String>,
}

impl Mount {
    pub(crate) fn standalone(host: Rc<Host>) -> Self {
        Self {
            host,
            prefix: Vec::new(),
        }
    }

    pub(crate) fn is_standalone(&self) -> bool {
        self.prefix.is_empty()
    }

    /// The store's own root slice.
    pub(crate) fn state(&self) -> Slice {
        let root = self.host.root();
        root.lookup(&self.prefix).cloned().unwrap_or_default()
    }

    /// The slice at a store-relative path.
    pub(crate) fn read(&self, path: &[String]) -> Option<Slice> {
        let root = self.host.root();
        root.lookup(&self.prefix)?.lookup(path).cloned()
    }

    pub(crate) fn write(&self, path: &[String], value: Slice) -> Result<(), DispatchError> {
        self.host.write(&self.qualify_segments(path), value)
    }

    fn qualify_segments(&self, path: &[String]) -> Vec<String> {
        self.prefix.iter().chain(path).cloned().collect()
    }

    /// Render a store-relative path as seen from the host root.
    pub(crate) fn qualify(&self, path: &str) -> String {
        match (self.prefix.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => self.prefix.join("/"),
            (false, false) => format!("{}/{}", self.prefix.join("/"), path),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn segments(path: &str) -> Vec<String> {
        path.split('/').map(str::to_string).collect()
    }

    #[test]
    fn mounted_reads_and_writes_go_through_the_prefix() {
        let host = Host::new(Slice::from(json!({ "foo": { "n": 1 }, "bar": 2 })));
        let mount = Mount {
            host: Rc::clone(&host),
            prefix: segments("foo"),
        };
        assert_eq!(mount.state(), json!({ "n": 1 }));
        assert_eq!(mount.read(&segments("n")).unwrap().as_i64(), Some(1));

        let before = host.root();
        mount.write(&segments("n"), Slice::from(5)).unwrap();
        let after = host.root();
        assert!(!Slice::ptr_eq(&before, &after));
        assert!(Slice::ptr_eq(before.get("bar").unwrap(), after.get("bar").unwrap()));
        assert_eq!(after, json!({ "foo": { "n": 5 }, "bar": 2 }));
    }

    #[test]
    fn writes_through_missing_intermediates_fail() {
        let host = Host::new(Slice::from(json!({ "a": 1 })));
        let err = host.write(&segments("x/y"), Slice::from(1)).unwrap_err();
        assert_eq!(err, DispatchError::UnknownPath { path: "x/y".into() });
    }

    #[test]
    fn qualify_prefixes_paths() {
        let host = Host::new(Slice::empty());
        let standalone = Mount::standalone(Rc::clone(&host));
        assert_eq!(standalone.qualify("counter/inc"), "counter/inc");
        assert!(standalone.is_standalone());

        let mounted = Mount {
            host,
            prefix: segments("app/foo"),
        };
        assert_eq!(mounted.qualify("call"), "app/foo/call");
        assert_eq!(mounted.qualify(""), "app/foo");
    }
}
