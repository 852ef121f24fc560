use arbor_types::{BatchEntry, DispatchError, Notification, Value};
use tracing::debug;

use crate::store::Store;

/// The batch queue of a store.
///
/// Entries accumulate without touching state. [`done`](Self::done) drains
/// the queue in FIFO order under a single stage, so the whole flush is
/// observed as one [`Trigger::Batch`](arbor_types::Trigger::Batch)
/// notification. Staging and batching are independent: a flush inside an
/// open stage folds into that stage's notification.
pub struct Batch<'a> {
    store: &'a Store,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Queue an invocation of the mutate or act node at `path`.
    pub fn push(&self, path: impl Into<String>, args: &[Value]) -> &Self {
        self.store
            .inner
            .batch
            .borrow_mut()
            .push(BatchEntry::new(path, args));
        self
    }

    pub fn len(&self) -> usize {
        self.store.inner.batch.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.inner.batch.borrow().is_empty()
    }

    /// Queued entries, oldest first.
    pub fn entries(&self) -> Vec<BatchEntry> {
        self.store.inner.batch.borrow().clone()
    }

    /// Flush the queue. Entries whose path does not resolve are skipped.
    ///
    /// Returns whether subscribers were notified; an empty queue is a
    /// no-op. The queue is cleared even when an entry fails, and the first
    /// failure is returned after the stage has been closed.
    pub fn done(&self) -> Result<bool, DispatchError> {
        let entries = std::mem::take(&mut *self.store.inner.batch.borrow_mut());
        if entries.is_empty() {
            return Ok(false);
        }

        let host = self.store.mount().host;
        let owned = host.notifier().stage();
        let mut outcome = Ok(());
        for entry in &entries {
            if let Err(err) = self.store.invoke(&entry.path, &entry.args) {
                outcome = Err(err);
                break;
            }
        }
        debug!(store = %self.store.name(), entries = entries.len(), "batch flushed");

        let notified = if owned {
            let mount = self.store.mount();
            let qualified = entries
                .iter()
                .map(|e| BatchEntry::new(mount.qualify(&e.path), &e.args))
                .collect();
            mount
                .host
                .notifier()
                .stage_push(&Notification::batch(mount.qualify(""), qualified))
        } else {
            false
        };
        outcome.map(|()| notified)
    }
}
