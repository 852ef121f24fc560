//! State persistence for Arbor stores.
//!
//! A [`StatePersistor`] holds whole-state snapshots as JSON values:
//!
//! - [`MemoryPersistor`]: in memory, for tests and embedding
//! - [`JsonFilePersistor`]: a JSON file, replaced atomically on save
//!
//! [`restore`] loads a snapshot into a store through
//! [`Store::replace_state`](arbor_store::Store::replace_state), and
//! [`attach`] keeps a persistor in sync by saving after every notification.

pub mod error;
pub mod file;
pub mod memory;
pub mod sync;
pub mod traits;

pub use error::{PersistError, PersistResult};
pub use file::JsonFilePersistor;
pub use memory::MemoryPersistor;
pub use sync::{attach, restore, save};
pub use traits::StatePersistor;
