//! JSON-file backed index store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::traits::{IndexSnapshot, IndexStore};

/// Stores the index as pretty-printed JSON at a fixed path.
///
/// Saves go through a temporary file in the same directory that is then
/// renamed over the target, so readers never observe a half-written index.
#[derive(Clone, Debug)]
pub struct JsonFileIndexStore {
    path: PathBuf,
}

impl JsonFileIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexStore for JsonFileIndexStore {
    fn load(&self) -> IndexResult<Option<IndexSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Some(IndexSnapshot::new()));
        }
        let snapshot: IndexSnapshot = serde_json::from_str(&text)
            .map_err(|e| IndexError::Serialization(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), entries = snapshot.len(), "loaded index file");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &IndexSnapshot) -> IndexResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| IndexError::Io(e.error))?;

        debug!(path = %self.path.display(), entries = snapshot.len(), "wrote index file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PersistedEntry;
    use tally_types::{FileRecord, Origin};

    fn sample() -> IndexSnapshot {
        let mut snapshot = IndexSnapshot::new();
        snapshot.insert(
            "ui/button@1.0.0".to_string(),
            PersistedEntry {
                files: vec![FileRecord::new("ui/button.js"), FileRecord::test("ui/button.test.js")],
                main_file: Some("ui/button.js".to_string()),
                origin: Origin::Imported,
                root_dir: Some("ui".to_string()),
            },
        );
        snapshot
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIndexStore::new(dir.path().join("index.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIndexStore::new(dir.path().join(".tally/index.json"));
        store.save(&sample()).unwrap();

        assert_eq!(store.load().unwrap(), Some(sample()));

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"ui/button@1.0.0\""));
        assert!(text.contains("\"relativePath\": \"ui/button.test.js\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIndexStore::new(dir.path().join("index.json"));
        store.save(&sample()).unwrap();
        store.save(&IndexSnapshot::new()).unwrap();

        assert_eq!(store.load().unwrap(), Some(IndexSnapshot::new()));
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn corrupt_json_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileIndexStore::new(&path).load().unwrap_err();
        assert!(matches!(err, IndexError::Serialization(_)));
    }
}
