use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::IndexResult;
use crate::traits::{IndexSnapshot, IndexStore};

/// In-memory index store.
///
/// Intended for tests and embedding. Counts saves so callers can check that
/// an operation persisted exactly once.
pub struct InMemoryIndexStore {
    snapshot: RwLock<Option<IndexSnapshot>>,
    saves: AtomicUsize,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            saves: AtomicUsize::new(0),
        }
    }

    /// A store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: IndexSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// The currently stored snapshot, if any.
    pub fn snapshot(&self) -> Option<IndexSnapshot> {
        self.snapshot.read().expect("lock poisoned").clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for InMemoryIndexStore {
    fn load(&self) -> IndexResult<Option<IndexSnapshot>> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &IndexSnapshot) -> IndexResult<()> {
        *self.snapshot.write().expect("lock poisoned") = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PersistedEntry;
    use tally_types::{FileRecord, Origin};

    #[test]
    fn save_then_load() {
        let store = InMemoryIndexStore::new();
        assert!(store.load().unwrap().is_none());

        let mut snapshot = IndexSnapshot::new();
        snapshot.insert(
            "ui/button".to_string(),
            PersistedEntry {
                files: vec![FileRecord::new("ui/button.js")],
                main_file: None,
                origin: Origin::Authored,
                root_dir: None,
            },
        );
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), Some(snapshot));
        assert_eq!(store.save_count(), 1);
    }
}
