use std::cell::Cell;

/// State of a [`Staging`] controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StageState {
    #[default]
    Idle,
    Staging,
}

/// The IDLE/STAGING state machine behind synchronous notification collapse.
#[derive(Debug, Default)]
pub struct Staging(Cell<StageState>);

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StageState {
        self.0.get()
    }

    pub fn is_staging(&self) -> bool {
        self.0.get() == StageState::Staging
    }

    /// Enter STAGING. Returns `true` only when this call made the
    /// transition, so nested callers can tell whether they own the stage.
    pub fn stage(&self) -> bool {
        self.0.replace(StageState::Staging) == StageState::Idle
    }

    /// Return to IDLE. Returns `true` if a stage was open.
    pub fn finish(&self) -> bool {
        self.0.replace(StageState::Idle) == StageState::Staging
    }
}
