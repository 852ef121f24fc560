//! Notification plumbing for Arbor.
//!
//! Every store owns one [`Notifier`], which bundles:
//! - a [`SubscriptionRegistry`] with copy-on-write snapshots, so callbacks
//!   can subscribe and unsubscribe while a pass is running;
//! - a [`ChangeFlag`] that separates real mutations from no-ops;
//! - a [`Staging`] controller that collapses a run of mutations into a
//!   single notification.
//!
//! Everything here is single-threaded. Stores run on one thread with
//! synchronous call/return, and `Cell`/`RefCell` stand in for locks.

pub mod flag;
pub mod notifier;
pub mod registry;
pub mod staging;

pub use flag::ChangeFlag;
pub use notifier::Notifier;
pub use registry::{ListenerFn, Subscriber, SubscriptionId, SubscriptionRegistry};
pub use staging::{StageState, Staging};
