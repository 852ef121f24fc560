use std::cell::Cell;

/// Records whether a mutation since the last notification actually changed
/// state.
///
/// Only real changes set the flag; no-op mutations leave it alone, so a
/// staged sequence that ends in a no-op still notifies for the earlier
/// change.
#[derive(Debug, Default)]
pub struct ChangeFlag(Cell<bool>);

impl ChangeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.0.set(true);
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }

    /// Clear the flag, returning its previous value.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}
