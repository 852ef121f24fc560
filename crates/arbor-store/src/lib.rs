//! The Arbor store engine.
//!
//! [`Store::new`] installs a tree of module descriptors into four access
//! trees of identical shape:
//!
//! - **read**: module slices, state keys, and getters;
//! - **mutate**: reducers, with propagation and change detection;
//! - **act**: actions, run against a [`Scope`] of their module;
//! - **select**: memoized selectors over read and select paths.
//!
//! Every store owns a single-writer state cell and a notifier. Mutations
//! propagate synchronously, fire cross-module listeners, and notify
//! subscribers once per external call, or once per stage or batch.
//! [`Store::combine`] mounts independent stores into one aggregate without
//! invalidating handles taken before composition.
//!
//! # Modules
//!
//! - [`store`]: [`Store`], [`Subscription`], and the mutation protocol
//! - [`tree`]: [`AccessTree`] and [`Shape`]
//! - [`node`]: bound accessor nodes
//! - [`propagation`]: how results fold into their slice
//! - [`memo`]: the selector cache
//! - [`router`]: the listener router
//! - [`scope`]: [`Scope`], the module-scoped [`ActionContext`](arbor_module::ActionContext)
//! - [`batch`]: the batch queue
//! - [`collection`]: store composition
//! - [`config`]: [`StoreConfig`]
//! - [`error`]: [`StoreError`]

pub mod batch;
pub mod collection;
pub mod config;
pub mod error;
mod host;
mod install;
pub mod memo;
pub mod node;
pub mod propagation;
pub mod router;
pub mod scope;
pub mod store;
pub mod tree;

pub use batch::Batch;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memo::Memo;
pub use node::{ActNode, MutateNode, ReadNode, SelectNode};
pub use propagation::Propagation;
pub use router::{ListenerRouter, Route};
pub use scope::Scope;
pub use store::{Store, Subscription, WeakStore};
pub use tree::{AccessTree, Entry, Shape};
