use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// A `/`-delimited address into a store: a module, a state key, or an
/// accessor beneath it.
///
/// The empty path addresses the store root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a path string. `""` and `"/"` both denote the root; a single
    /// leading `/` is accepted and ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor_types::ModulePath;
    ///
    /// let path = ModulePath::parse("todos/items/append").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert!(ModulePath::parse("todos//append").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, DispatchError> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(DispatchError::InvalidPath {
                    path: s.to_string(),
                    reason: "path segments must not be empty".into(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// A new path with every segment of `other` appended.
    pub fn concat(&self, other: &ModulePath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Everything but the last segment; `None` at the root.
    pub fn parent(&self) -> Option<ModulePath> {
        self.0
            .split_last()
            .map(|(_, rest)| Self(rest.to_vec()))
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn starts_with(&self, prefix: &ModulePath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl FromStr for ModulePath {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ModulePath> for String {
    fn from(path: ModulePath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for ModulePath {
    type Error = DispatchError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
