use serde::{Deserialize, Serialize};

/// Per-module behavior flags.
///
/// A module without its own flags inherits its parent's; the root inherits
/// the store configuration's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enhance {
    /// When `true`, a value returned by an action is pushed into the
    /// action's own module as a state patch.
    pub auto_apply_actions: bool,
}

impl Enhance {
    /// Flags with action auto-apply switched on.
    pub fn auto_apply() -> Self {
        Self {
            auto_apply_actions: true,
        }
    }
}
