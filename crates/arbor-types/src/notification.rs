use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of invocation produced a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A state-transition function (mutate node) or a push.
    Reducer,
    /// An orchestration action (act node).
    Action,
    /// A flushed batch queue.
    Batch,
    /// Whole-state replacement, e.g. restoring persisted state.
    Replace,
}

impl Trigger {
    pub fn is_reducer(&self) -> bool {
        matches!(self, Self::Reducer)
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reducer => f.write_str("reducer"),
            Self::Action => f.write_str("action"),
            Self::Batch => f.write_str("batch"),
            Self::Replace => f.write_str("replace"),
        }
    }
}

/// A queued invocation waiting for a batch flush.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Path of the mutate or act node, relative to the queueing store.
    pub path: String,
    pub args: Vec<Value>,
}

impl BatchEntry {
    pub fn new(path: impl Into<String>, args: &[Value]) -> Self {
        Self {
            path: path.into(),
            args: args.to_vec(),
        }
    }
}

/// Delivered to every subscriber after a state change becomes observable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Path of the triggering node, relative to the root of the store that
    /// owns the subscriber registry.
    pub path: String,
    /// Arguments forwarded to the triggering node.
    pub args: Vec<Value>,
    pub trigger: Trigger,
    /// The flushed entries, for [`Trigger::Batch`] notifications.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<BatchEntry>,
}

impl Notification {
    pub fn new(path: impl Into<String>, args: &[Value], trigger: Trigger) -> Self {
        Self {
            path: path.into(),
            args: args.to_vec(),
            trigger,
            entries: Vec::new(),
        }
    }

    /// A notification summarising a batch flush.
    pub fn batch(path: impl Into<String>, entries: Vec<BatchEntry>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            trigger: Trigger::Batch,
            entries,
        }
    }
}
