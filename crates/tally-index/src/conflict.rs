//! Override scope and the soft-conflict accumulator used by upserts.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tally_types::ComponentId;

/// Which already-tracked files an upsert may reassign to the new component.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OverrideScope {
    /// Never reassign; conflicts become warnings.
    #[default]
    None,
    /// Reassign every conflicting file.
    All,
    /// Reassign only these relative paths.
    Paths(BTreeSet<String>),
}

impl OverrideScope {
    pub fn from_flag(override_all: bool) -> Self {
        if override_all {
            Self::All
        } else {
            Self::None
        }
    }

    pub fn covers(&self, relative_path: &str) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Paths(paths) => paths.contains(relative_path),
        }
    }
}

/// Files skipped because another component already tracks them, keyed by
/// the id of the component they were skipped from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConflictWarnings {
    skipped: BTreeMap<String, BTreeSet<String>>,
}

impl ConflictWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &ComponentId, relative_path: impl Into<String>) {
        self.skipped
            .entry(id.to_string())
            .or_default()
            .insert(relative_path.into());
    }

    /// Skipped paths for one component.
    pub fn for_id(&self, id: &ComponentId) -> Option<&BTreeSet<String>> {
        self.skipped.get(&id.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Total number of skipped files across all components.
    pub fn len(&self) -> usize {
        self.skipped.values().map(BTreeSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.skipped.iter().map(|(id, paths)| (id.as_str(), paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_scope_coverage() {
        assert!(!OverrideScope::None.covers("a.js"));
        assert!(OverrideScope::All.covers("a.js"));
        let only = OverrideScope::Paths(["a.js".to_string()].into_iter().collect());
        assert!(only.covers("a.js"));
        assert!(!only.covers("b.js"));
        assert_eq!(OverrideScope::from_flag(true), OverrideScope::All);
    }

    #[test]
    fn warnings_group_by_id() {
        let a: ComponentId = "ui/a".parse().unwrap();
        let b: ComponentId = "ui/b".parse().unwrap();
        let mut warnings = ConflictWarnings::new();
        warnings.record(&a, "x.js");
        warnings.record(&a, "x.js");
        warnings.record(&a, "y.js");
        warnings.record(&b, "z.js");

        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings.for_id(&a).unwrap().len(), 2);
        assert_eq!(
            serde_json::to_value(&warnings).unwrap(),
            serde_json::json!({"ui/a": ["x.js", "y.js"], "ui/b": ["z.js"]})
        );
    }
}
