//! Foundation types for Arbor.
//!
//! This crate provides the value, addressing, and notification types shared
//! by every other Arbor crate.
//!
//! # Key Types
//!
//! - [`Slice`] -- A node of the state tree, either primitive or structured,
//!   with reference identity for change detection
//! - [`SliceKind`] -- The fixed shape of a module's slice
//! - [`ModulePath`] -- `/`-delimited address of a module or accessor
//! - [`Notification`] -- What subscribers receive after a state change
//! - [`Trigger`] -- Discriminates reducer, action, batch, and replace triggers
//! - [`DispatchError`] -- Errors raised while invoking accessors at runtime

pub mod error;
pub mod notification;
pub mod path;
pub mod slice;

pub use error::DispatchError;
pub use notification::{BatchEntry, Notification, Trigger};
pub use path::ModulePath;
pub use slice::{Slice, SliceKind};

/// Re-exported so downstream crates and callers share one JSON value type.
pub use serde_json::Value;
