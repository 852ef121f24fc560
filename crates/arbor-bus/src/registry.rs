use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use arbor_types::Notification;
use tracing::trace;

/// Signature of a subscriber callback.
pub type ListenerFn = dyn Fn(&Notification);

/// Identifies one subscription.
///
/// Ids are unique for the life of the process, so subscribers can move
/// between registries (store composition) without clashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A registered callback.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriptionId,
    listener: Rc<ListenerFn>,
}

impl Subscriber {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Copy-on-write subscriber list.
///
/// `next` receives every subscribe and unsubscribe. A notification pass
/// promotes `next` to `current` and iterates that snapshot, so changes made
/// from inside a callback only show up in later passes. The vector is only
/// copied when a snapshot is still alive while `next` is modified.
pub struct SubscriptionRegistry {
    current: RefCell<Rc<Vec<Subscriber>>>,
    next: RefCell<Rc<Vec<Subscriber>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        let empty = Rc::new(Vec::new());
        Self {
            current: RefCell::new(Rc::clone(&empty)),
            next: RefCell::new(empty),
        }
    }

    /// Register a callback for subsequent notification passes.
    pub fn subscribe(&self, listener: impl Fn(&Notification) + 'static) -> SubscriptionId {
        let subscriber = Subscriber {
            id: SubscriptionId::next(),
            listener: Rc::new(listener),
        };
        let id = subscriber.id;
        Rc::make_mut(&mut self.next.borrow_mut()).push(subscriber);
        trace!(%id, "subscribed");
        id
    }

    /// Remove a subscription. Returns `false` when it was already gone;
    /// calling this twice is harmless.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut next = self.next.borrow_mut();
        let Some(index) = next.iter().position(|s| s.id == id) else {
            return false;
        };
        Rc::make_mut(&mut next).remove(index);
        trace!(%id, "unsubscribed");
        true
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.next.borrow().iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.next.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.borrow().is_empty()
    }

    /// Run one notification pass. Returns the number of callbacks invoked.
    pub fn notify(&self, notification: &Notification) -> usize {
        let snapshot = {
            let next = Rc::clone(&self.next.borrow());
            *self.current.borrow_mut() = Rc::clone(&next);
            next
        };
        // No borrow is held here: callbacks may subscribe, unsubscribe, or
        // trigger nested passes.
        for subscriber in snapshot.iter() {
            (subscriber.listener)(notification);
        }
        snapshot.len()
    }

    /// Remove and return every subscriber, in registration order.
    pub fn drain(&self) -> Vec<Subscriber> {
        let mut next = self.next.borrow_mut();
        let drained: Vec<Subscriber> = next.iter().cloned().collect();
        *next = Rc::new(Vec::new());
        drained
    }

    /// Append subscribers taken from another registry, skipping ids already
    /// present.
    pub fn adopt(&self, subscribers: Vec<Subscriber>) {
        let mut next = self.next.borrow_mut();
        for subscriber in subscribers {
            if !next.iter().any(|s| s.id == subscriber.id) {
                Rc::make_mut(&mut next).push(subscriber);
            }
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}
