//! Component index for tally.
//!
//! The durable mapping from component identity to tracked files, origin and
//! root directory. Lookups work by path, by exact id, or fuzzily by
//! namespace and name. The index is read once at operation start and
//! written in full once at operation end.
//!
//! # Key Types
//!
//! - [`ComponentIndex`] -- the in-memory index with its reverse path map
//! - [`ComponentIndexEntry`] -- a tracked component
//! - [`ComponentDescriptor`] -- a candidate component awaiting reconciliation
//! - [`OverrideScope`] / [`ConflictWarnings`] -- conflict policy and its accumulator
//! - [`IndexStore`] -- persistence backend trait
//! - [`InMemoryIndexStore`] / [`JsonFileIndexStore`] -- backends

pub mod conflict;
pub mod entry;
pub mod error;
pub mod file;
pub mod index;
pub mod memory;
pub mod traits;

pub use conflict::{ConflictWarnings, OverrideScope};
pub use entry::{ComponentDescriptor, ComponentIndexEntry, PersistedEntry};
pub use error::{IndexError, IndexResult};
pub use file::JsonFileIndexStore;
pub use index::{ComponentIndex, UpsertOutcome};
pub use memory::InMemoryIndexStore;
pub use traits::{IndexSnapshot, IndexStore};
