//! Module descriptors for Arbor.
//!
//! A store is configured with a tree of [`ModuleDescriptor`]s. Each module
//! declares its initial state, pure reducers, actions, getters, memoized
//! selectors, cross-module listeners, and nested modules. Descriptors are
//! consumed once, at installation time.
//!
//! # Quick Start
//!
//! ```rust
//! use arbor_module::ModuleDescriptor;
//! use arbor_types::{ModulePath, Slice};
//!
//! let counter = ModuleDescriptor::new().state(0).reducer("inc", |state, args| {
//!     let by = args.first().and_then(|v| v.as_i64()).unwrap_or(1);
//!     Some(Slice::from(state.as_i64()? + by))
//! });
//! let root = ModuleDescriptor::new().module("counter", counter);
//! assert!(root.validate(&ModulePath::root()).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`descriptor`] -- [`ModuleDescriptor`] and its builder
//! - [`entry`] -- Callable wrappers: [`Reducer`], [`Action`], [`Getter`],
//!   [`Selector`], [`Listener`], [`Plugin`]
//! - [`context`] -- [`ActionContext`], the scoped handle actions receive
//! - [`enhance`] -- [`Enhance`] behavior flags
//! - [`names`] -- Entry name validation
//! - [`error`] -- [`ConfigError`]

pub mod context;
pub mod descriptor;
pub mod enhance;
pub mod entry;
pub mod error;
pub mod names;

pub use context::{ActionContext, ListenerContext};
pub use descriptor::ModuleDescriptor;
pub use enhance::Enhance;
pub use entry::{
    Action, ActionResult, Getter, Listener, Plugin, Reducer, ReducerEntry, ReducerGroup, Selector,
};
pub use error::ConfigError;
pub use names::{validate_name, validate_reducer_name, RESERVED_REDUCER_NAMES};
