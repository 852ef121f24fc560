use std::collections::BTreeMap;

use arbor_types::{DispatchError, Slice, SliceKind};

/// How a value produced for one slice is folded into it.
///
/// Primitive slices are replaced outright. Structured slices take a shallow
/// merge into a fresh container, so keys the result omits (sub-module
/// slices in particular) survive. Keys naming installed sub-modules keep
/// their kind through the merge. Writing the settled value back into the
/// host renews every ancestor up to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Propagation {
    path: Vec<String>,
    kind: SliceKind,
    modules: BTreeMap<String, SliceKind>,
}

impl Propagation {
    pub fn new(path: Vec<String>, kind: SliceKind) -> Self {
        Self {
            path,
            kind,
            modules: BTreeMap::new(),
        }
    }

    /// Pin the kinds of the sub-modules installed under this slice.
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = (S, SliceKind)>,
        S: Into<String>,
    {
        self.modules
            .extend(modules.into_iter().map(|(name, kind)| (name.into(), kind)));
        self
    }

    /// Store-relative path of the slice this propagation writes.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn kind(&self) -> SliceKind {
        self.kind
    }

    /// The value to store when `result` is proposed over `prior`.
    pub fn settle(&self, prior: &Slice, result: Slice) -> Result<Slice, DispatchError> {
        if result.kind() != self.kind {
            return Err(DispatchError::KindMismatch {
                path: self.path.join("/"),
                expected: self.kind,
                found: result.kind(),
            });
        }
        match self.kind {
            SliceKind::Primitive => Ok(result),
            SliceKind::Structured => {
                for (key, value) in result.entries().into_iter().flatten() {
                    let Some(&expected) = self.modules.get(key) else {
                        continue;
                    };
                    if value.kind() != expected {
                        let mut path = self.path.clone();
                        path.push(key.clone());
                        return Err(DispatchError::KindMismatch {
                            path: path.join("/"),
                            expected,
                            found: value.kind(),
                        });
                    }
                }
                prior
                    .merge(&result)
                    .ok_or_else(|| DispatchError::KindMismatch {
                        path: self.path.join("/"),
                        expected: self.kind,
                        found: prior.kind(),
                    })
            }
        }
    }
}
