use thiserror::Error;

use crate::slice::SliceKind;

/// Errors produced while invoking accessors on an installed store.
///
/// Unresolvable paths are normally absorbed into a no-op by the store; the
/// variants here cover the cases that must reach the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A reducer or push produced a value whose kind differs from the slice
    /// it targets.
    #[error("kind mismatch at '{path}': slice is {expected}, result is {found}")]
    KindMismatch {
        path: String,
        expected: SliceKind,
        found: SliceKind,
    },

    /// The path does not resolve where resolution is mandatory.
    #[error("unknown path: {path}")]
    UnknownPath { path: String },

    /// The path string is malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A user action reported a failure.
    #[error("action '{path}' failed: {message}")]
    Action { path: String, message: String },
}

impl DispatchError {
    /// Convenience constructor for action failures.
    pub fn action(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            path: path.into(),
            message: message.into(),
        }
    }
}
