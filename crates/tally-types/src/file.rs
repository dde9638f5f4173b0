//! File records tracked as part of a component.

use serde::{Deserialize, Serialize};

/// A single file belonging to a component.
///
/// `relative_path` is workspace-relative and forward-slash normalized; it is
/// the uniqueness key within a component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub relative_path: String,
    #[serde(rename = "test", default)]
    pub is_test: bool,
    #[serde(default)]
    pub name: String,
}

impl FileRecord {
    /// A regular (non-test) file. `name` is derived from the last path segment.
    pub fn new(relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let name = file_name_of(&relative_path).to_string();
        Self {
            relative_path,
            is_test: false,
            name,
        }
    }

    /// A test file.
    pub fn test(relative_path: impl Into<String>) -> Self {
        Self {
            is_test: true,
            ..Self::new(relative_path)
        }
    }

    /// Fill in `name` when it was absent from persisted data.
    pub fn with_derived_name(mut self) -> Self {
        if self.name.is_empty() {
            self.name = file_name_of(&self.relative_path).to_string();
        }
        self
    }
}

fn file_name_of(relative_path: &str) -> &str {
    relative_path
        .rsplit('/')
        .next()
        .unwrap_or(relative_path)
}
