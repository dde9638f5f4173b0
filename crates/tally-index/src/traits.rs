use std::collections::BTreeMap;

use crate::entry::PersistedEntry;
use crate::error::IndexResult;

/// Full persisted form of the index, keyed by component id string.
pub type IndexSnapshot = BTreeMap<String, PersistedEntry>;

/// Durable storage for the component index.
///
/// Implementations must guarantee:
/// - `save` replaces the whole stored index; there are no partial updates.
/// - A failed `save` leaves the previously stored index readable.
/// - All I/O errors are propagated, never silently ignored.
pub trait IndexStore: Send + Sync {
    /// Read the stored index.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    fn load(&self) -> IndexResult<Option<IndexSnapshot>>;

    /// Replace the stored index with `snapshot`.
    fn save(&self, snapshot: &IndexSnapshot) -> IndexResult<()>;
}
