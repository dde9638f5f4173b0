//! Index entry types: tracked components and the descriptors that feed them.

use serde::{Deserialize, Serialize};
use tally_types::{ComponentId, FileRecord, Origin};

/// A tracked component: its identity, files and provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentIndexEntry {
    pub id: ComponentId,
    /// Tracked files, workspace-relative.
    pub files: Vec<FileRecord>,
    /// Entry-point file, always one of `files` when set.
    pub main_file: Option<String>,
    pub origin: Origin,
    /// Directory the component was added from, if it was added as a directory.
    pub root_dir: Option<String>,
}

impl ComponentIndexEntry {
    /// Create an empty entry.
    pub fn new(id: ComponentId, origin: Origin) -> Self {
        Self {
            id,
            files: Vec::new(),
            main_file: None,
            origin,
            root_dir: None,
        }
    }

    pub fn with_files(mut self, files: Vec<FileRecord>) -> Self {
        self.files = files;
        self
    }

    pub fn with_main_file(mut self, main_file: impl Into<String>) -> Self {
        self.main_file = Some(main_file.into());
        self
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<String>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    /// Look up a tracked file by relative path.
    pub fn file(&self, relative_path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.relative_path == relative_path)
    }

    pub fn has_file(&self, relative_path: &str) -> bool {
        self.file(relative_path).is_some()
    }

    /// Relative paths of all tracked files, in tracking order.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.relative_path.as_str())
    }

    pub fn test_files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(|f| f.is_test)
    }

    /// Drop a file, clearing `main_file` if it pointed at it.
    /// Returns `true` if the file was tracked.
    pub(crate) fn remove_file(&mut self, relative_path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.relative_path != relative_path);
        if self.main_file.as_deref() == Some(relative_path) {
            self.main_file = None;
        }
        self.files.len() != before
    }
}

/// A component as assembled by the add resolver, not yet reconciled
/// against the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub id: ComponentId,
    pub files: Vec<FileRecord>,
    pub main_file: Option<String>,
    pub root_dir: Option<String>,
}

impl ComponentDescriptor {
    pub fn new(id: ComponentId, files: Vec<FileRecord>) -> Self {
        Self {
            id,
            files,
            main_file: None,
            root_dir: None,
        }
    }

    pub fn with_main_file(mut self, main_file: impl Into<String>) -> Self {
        self.main_file = Some(main_file.into());
        self
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<String>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }
}

/// On-disk shape of one entry; the id lives in the enclosing map key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry {
    pub files: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
}

impl From<&ComponentIndexEntry> for PersistedEntry {
    fn from(entry: &ComponentIndexEntry) -> Self {
        Self {
            files: entry.files.clone(),
            main_file: entry.main_file.clone(),
            origin: entry.origin,
            root_dir: entry.root_dir.clone(),
        }
    }
}

impl PersistedEntry {
    pub fn into_entry(self, id: ComponentId) -> ComponentIndexEntry {
        ComponentIndexEntry {
            id,
            files: self.files,
            main_file: self.main_file,
            origin: self.origin,
            root_dir: self.root_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ComponentId {
        s.parse().unwrap()
    }

    #[test]
    fn remove_file_clears_main() {
        let mut entry = ComponentIndexEntry::new(id("ui/button"), Origin::Authored)
            .with_files(vec![FileRecord::new("ui/button.js"), FileRecord::new("ui/style.css")])
            .with_main_file("ui/button.js");

        assert!(entry.remove_file("ui/button.js"));
        assert_eq!(entry.main_file, None);
        assert_eq!(entry.file_paths().collect::<Vec<_>>(), vec!["ui/style.css"]);
        assert!(!entry.remove_file("ui/button.js"));
    }

    #[test]
    fn persisted_shape_is_camel_case() {
        let entry = ComponentIndexEntry::new(id("ui/button"), Origin::Imported)
            .with_files(vec![FileRecord::new("ui/button.js"), FileRecord::test("ui/button.test.js")])
            .with_main_file("ui/button.js")
            .with_root_dir("ui");

        let json = serde_json::to_value(PersistedEntry::from(&entry)).unwrap();
        assert_eq!(json["mainFile"], "ui/button.js");
        assert_eq!(json["rootDir"], "ui");
        assert_eq!(json["origin"], "imported");
        assert_eq!(json["files"][1]["test"], true);

        let back: PersistedEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.into_entry(id("ui/button")), entry);
    }
}
