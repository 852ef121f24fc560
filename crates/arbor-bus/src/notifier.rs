use arbor_types::Notification;
use tracing::trace;

use crate::flag::ChangeFlag;
use crate::registry::SubscriptionRegistry;
use crate::staging::Staging;

/// Subscriber registry, change flag, and staging controller of one store.
///
/// There are two ways a notification goes out:
/// - [`notify`](Self::notify), the unstaged path used after a single
///   mutation, which stays silent while a stage is open;
/// - [`stage_push`](Self::stage_push), which closes an open stage and emits
///   one notification for everything that changed inside it.
///
/// Both only notify when the change flag is set, and both clear it.
#[derive(Debug, Default)]
pub struct Notifier {
    registry: SubscriptionRegistry,
    flag: ChangeFlag,
    staging: Staging,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn flag(&self) -> &ChangeFlag {
        &self.flag
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    pub fn mark_changed(&self) {
        self.flag.mark();
    }

    /// Open a stage. Returns `true` if this call opened it.
    pub fn stage(&self) -> bool {
        self.staging.stage()
    }

    pub fn is_staging(&self) -> bool {
        self.staging.is_staging()
    }

    /// Unstaged notification. Returns `true` if subscribers were called.
    pub fn notify(&self, notification: &Notification) -> bool {
        if self.staging.is_staging() {
            trace!(path = %notification.path, "notification deferred by stage");
            return false;
        }
        self.emit(notification)
    }

    /// Close the open stage and emit a single notification if anything
    /// changed inside it. A no-op when no stage is open.
    pub fn stage_push(&self, notification: &Notification) -> bool {
        if !self.staging.finish() {
            return false;
        }
        self.emit(notification)
    }

    fn emit(&self, notification: &Notification) -> bool {
        if !self.flag.take() {
            return false;
        }
        let called = self.registry.notify(notification);
        trace!(
            path = %notification.path,
            trigger = %notification.trigger,
            subscribers = called,
            "notified"
        );
        true
    }
}
