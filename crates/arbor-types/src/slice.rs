//! State tree values.
//!
//! A [`Slice`] is a cheaply clonable handle to an immutable node of the state
//! tree. Structured slices are compared by reference identity when deciding
//! whether a mutation changed anything, so every update allocates fresh
//! containers along the path it touches and shares everything else.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The shape of a slice: a keyed collection or anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceKind {
    /// Numbers, strings, booleans, arrays, and null.
    Primitive,
    /// An ordered mapping from string keys to sub-slices.
    Structured,
}

impl fmt::Display for SliceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive => f.write_str("primitive"),
            Self::Structured => f.write_str("structured"),
        }
    }
}

#[derive(Debug)]
enum Node {
    Primitive(Value),
    Structured(BTreeMap<String, Slice>),
}

/// A node of the state tree.
///
/// Cloning a `Slice` clones a reference, never the underlying data.
#[derive(Clone)]
pub struct Slice(Rc<Node>);

impl Slice {
    /// The `null` primitive.
    pub fn null() -> Self {
        Self(Rc::new(Node::Primitive(Value::Null)))
    }

    /// An empty structured slice.
    pub fn empty() -> Self {
        Self(Rc::new(Node::Structured(BTreeMap::new())))
    }

    /// Build a structured slice from key/slice pairs.
    pub fn structured<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Slice)>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self(Rc::new(Node::Structured(map)))
    }

    /// Convert a JSON value. Objects become structured slices, recursively;
    /// everything else (arrays included) stays primitive.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::structured(
                map.into_iter().map(|(k, v)| (k, Self::from_value(v))),
            ),
            other => Self(Rc::new(Node::Primitive(other))),
        }
    }

    /// Convert back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self.0.as_ref() {
            Node::Primitive(v) => v.clone(),
            Node::Structured(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_value())).collect(),
            ),
        }
    }

    pub fn kind(&self) -> SliceKind {
        match self.0.as_ref() {
            Node::Primitive(_) => SliceKind::Primitive,
            Node::Structured(_) => SliceKind::Structured,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.0.as_ref(), Node::Structured(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.0.as_ref(), Node::Primitive(Value::Null))
    }

    /// The raw value of a primitive slice.
    pub fn as_value(&self) -> Option<&Value> {
        match self.0.as_ref() {
            Node::Primitive(v) => Some(v),
            Node::Structured(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.as_value().and_then(Value::as_array)
    }

    /// The entries of a structured slice.
    pub fn entries(&self) -> Option<&BTreeMap<String, Slice>> {
        match self.0.as_ref() {
            Node::Structured(map) => Some(map),
            Node::Primitive(_) => None,
        }
    }

    /// Keys of a structured slice; empty for primitives.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// The sub-slice at `key`, if this slice is structured and has it.
    pub fn get(&self, key: &str) -> Option<&Slice> {
        self.entries().and_then(|map| map.get(key))
    }

    /// Walk `path` one key at a time.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Slice> {
        path.iter()
            .try_fold(self, |node, key| node.get(key.as_ref()))
    }

    /// A fresh container equal to this one with `key` set to `value`.
    ///
    /// Returns `None` for primitive slices. Untouched entries keep their
    /// identity.
    pub fn with_key(&self, key: impl Into<String>, value: Slice) -> Option<Slice> {
        let mut map = self.entries()?.clone();
        map.insert(key.into(), value);
        Some(Self(Rc::new(Node::Structured(map))))
    }

    /// Shallow-merge `patch` into a fresh copy of this slice.
    ///
    /// Both slices must be structured; only the top level is merged.
    pub fn merge(&self, patch: &Slice) -> Option<Slice> {
        let mut map = self.entries()?.clone();
        for (key, value) in patch.entries()? {
            map.insert(key.clone(), value.clone());
        }
        Some(Self(Rc::new(Node::Structured(map))))
    }

    /// Replace the node at `path`, rebuilding every ancestor as a fresh
    /// container.
    ///
    /// An empty path replaces the whole slice. Intermediate nodes must exist
    /// and be structured; the final key may be new.
    pub fn replace_at<S: AsRef<str>>(&self, path: &[S], value: Slice) -> Option<Slice> {
        match path.split_first() {
            None => Some(value),
            Some((head, rest)) => {
                let next = if rest.is_empty() {
                    value
                } else {
                    self.get(head.as_ref())?.replace_at(rest, value)?
                };
                self.with_key(head.as_ref(), next)
            }
        }
    }

    /// Whether a mutation returning `other` over `self` is a no-op.
    ///
    /// Scalars (null, booleans, numbers, strings) compare by value. Arrays
    /// and structured slices compare by identity, so a fresh container is a
    /// change even when its content is equal.
    pub fn same(&self, other: &Slice) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.0.as_ref(), other.0.as_ref()) {
            (Node::Primitive(a), Node::Primitive(b)) => is_scalar(a) && a == b,
            _ => false,
        }
    }

    /// Reference identity.
    pub fn ptr_eq(a: &Slice, b: &Slice) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

impl Default for Slice {
    fn default() -> Self {
        Self::null()
    }
}

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.0.as_ref(), other.0.as_ref()) {
            (Node::Primitive(a), Node::Primitive(b)) => a == b,
            (Node::Structured(a), Node::Structured(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<Value> for Slice {
    fn eq(&self, other: &Value) -> bool {
        match (self.0.as_ref(), other) {
            (Node::Primitive(a), b) if !b.is_object() => a == b,
            (Node::Structured(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| v == bv))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            Node::Primitive(v) => write!(f, "Slice({v})"),
            Node::Structured(map) => f.debug_map().entries(map.iter()).finish(),
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<Value> for Slice {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<i64> for Slice {
    fn from(n: i64) -> Self {
        Self::from_value(Value::from(n))
    }
}

impl From<f64> for Slice {
    fn from(n: f64) -> Self {
        Self::from_value(Value::from(n))
    }
}

impl From<bool> for Slice {
    fn from(b: bool) -> Self {
        Self::from_value(Value::Bool(b))
    }
}

impl From<&str> for Slice {
    fn from(s: &str) -> Self {
        Self::from_value(Value::from(s))
    }
}

impl From<String> for Slice {
    fn from(s: String) -> Self {
        Self::from_value(Value::String(s))
    }
}

impl Serialize for Slice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Slice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}
