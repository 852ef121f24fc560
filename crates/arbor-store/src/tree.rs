//! Access trees.
//!
//! Installation produces four trees (read, mutate, act, select) whose
//! `children` mirror the module nesting exactly. Each level also carries
//! the entries its module declares; only the mutate tree uses groups.

use std::collections::BTreeMap;
use std::fmt;

/// An entry under a module: a bound node or a nested group of them.
#[derive(Clone, Debug)]
pub enum Entry<L> {
    Leaf(L),
    Group(BTreeMap<String, Entry<L>>),
}

impl<L> Entry<L> {
    fn resolve<S: AsRef<str>>(&self, rest: &[S]) -> Option<&L> {
        match (self, rest.split_first()) {
            (Entry::Leaf(leaf), None) => Some(leaf),
            (Entry::Group(group), Some((head, tail))) => group.get(head.as_ref())?.resolve(tail),
            _ => None,
        }
    }

    fn collect<'a>(&'a self, path: &str, out: &mut Vec<(String, &'a L)>) {
        match self {
            Entry::Leaf(leaf) => out.push((path.to_string(), leaf)),
            Entry::Group(group) => {
                for (name, entry) in group {
                    entry.collect(&format!("{path}/{name}"), out);
                }
            }
        }
    }
}

/// One level of an access tree.
#[derive(Clone, Debug)]
pub struct AccessTree<L> {
    pub(crate) node: Option<L>,
    pub(crate) entries: BTreeMap<String, Entry<L>>,
    pub(crate) children: BTreeMap<String, AccessTree<L>>,
}

impl<L> Default for AccessTree<L> {
    fn default() -> Self {
        Self {
            node: None,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }
}

impl<L> AccessTree<L> {
    /// The node bound to this module itself. Read trees carry one at every
    /// level, the root of an aggregate's read tree included; the other three
    /// trees leave it empty.
    pub fn node(&self) -> Option<&L> {
        self.node.as_ref()
    }

    pub fn child(&self, name: &str) -> Option<&AccessTree<L>> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &AccessTree<L>)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A leaf declared directly on this module.
    pub fn leaf(&self, name: &str) -> Option<&L> {
        match self.entries.get(name)? {
            Entry::Leaf(leaf) => Some(leaf),
            Entry::Group(_) => None,
        }
    }

    /// Resolve a module-relative path segment by segment: sub-modules first,
    /// then entries and groups. A path that ends on a module yields that
    /// module's own node.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&L> {
        match path.split_first() {
            None => self.node.as_ref(),
            Some((head, rest)) => match self.children.get(head.as_ref()) {
                Some(child) => child.resolve(rest),
                None => self.entries.get(head.as_ref())?.resolve(rest),
            },
        }
    }

    /// Every leaf in the tree with its `/`-joined path, depth first.
    pub fn leaves(&self) -> Vec<(String, &L)> {
        let mut out = Vec::new();
        self.collect("", &mut out);
        out
    }

    fn collect<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a L)>) {
        let join = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            }
        };
        for (name, entry) in &self.entries {
            entry.collect(&join(name), out);
        }
        for (name, child) in &self.children {
            child.collect(&join(name), out);
        }
    }

    /// The module nesting of this tree, without its entries.
    pub fn shape(&self) -> Shape {
        Shape(
            self.children
                .iter()
                .map(|(name, child)| (name.clone(), child.shape()))
                .collect(),
        )
    }

    /// Build a tree whose children are `members`, each kept intact under
    /// its key.
    pub(crate) fn rekeyed(node: Option<L>, members: Vec<(String, AccessTree<L>)>) -> Self {
        Self {
            node,
            entries: BTreeMap::new(),
            children: members.into_iter().collect(),
        }
    }
}

/// Module nesting of an access tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Shape(pub BTreeMap<String, Shape>);

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, child)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {child}")?;
        }
        f.write_str("}")
    }
}
