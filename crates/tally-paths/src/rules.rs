//! Ignore rules applied to every expansion and directory walk.
//!
//! Rules come from three sources, later sources taking precedence:
//! 1. The workspace `.gitignore` (optional)
//! 2. Configured patterns, in order
//! 3. Built-in patterns (always enforced, cannot be negated)

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

use crate::error::PathResult;

/// Patterns that are always ignored.
pub const BUILTIN_PATTERNS: &[&str] = &[".tally/", ".git/", "node_modules/"];

/// Compiled gitignore-style rules anchored at the workspace root.
pub struct IgnoreRules {
    root: PathBuf,
    matcher: Gitignore,
    configured: usize,
}

impl IgnoreRules {
    /// Built-in patterns plus `patterns`, without reading `.gitignore`.
    pub fn new(root: &Path, patterns: &[String]) -> PathResult<Self> {
        Self::build(root, patterns, false)
    }

    /// Built-in patterns plus `patterns`, layered over `<root>/.gitignore`
    /// when `use_gitignore` is set and the file exists.
    pub fn load(root: &Path, patterns: &[String], use_gitignore: bool) -> PathResult<Self> {
        Self::build(root, patterns, use_gitignore)
    }

    /// Only the built-in patterns.
    pub fn builtin(root: &Path) -> PathResult<Self> {
        Self::build(root, &[], false)
    }

    fn build(root: &Path, patterns: &[String], use_gitignore: bool) -> PathResult<Self> {
        let mut builder = GitignoreBuilder::new(root);

        if use_gitignore {
            let gitignore = root.join(".gitignore");
            if gitignore.is_file() {
                if let Some(err) = builder.add(&gitignore) {
                    return Err(err.into());
                }
            }
        }

        for pattern in patterns {
            builder.add_line(None, pattern)?;
        }
        for pattern in BUILTIN_PATTERNS {
            builder.add_line(None, pattern)?;
        }

        let matcher = builder.build()?;
        debug!(
            root = %root.display(),
            configured = patterns.len(),
            gitignore = use_gitignore,
            "ignore rules loaded"
        );

        Ok(Self {
            root: root.to_path_buf(),
            matcher,
            configured: patterns.len(),
        })
    }

    /// Whether a workspace-relative path (or any of its parents) is ignored.
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        if relative.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    /// Number of configured (non-built-in) patterns.
    pub fn configured_patterns(&self) -> usize {
        self.configured
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Debug for IgnoreRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreRules")
            .field("root", &self.root)
            .field("configured", &self.configured)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn builtin_patterns_always_enforced() {
        let dir = TempDir::new().unwrap();
        let rules = IgnoreRules::builtin(dir.path()).unwrap();

        assert!(rules.is_ignored(".tally/index.json", false));
        assert!(rules.is_ignored(".git/config", false));
        assert!(rules.is_ignored("src/node_modules/left-pad/index.js", false));
        assert!(!rules.is_ignored("src/index.js", false));
        assert!(!rules.is_ignored("", true));
    }

    #[test]
    fn configured_patterns_apply_in_order() {
        let dir = TempDir::new().unwrap();
        let patterns = vec!["*.log".to_string(), "!keep.log".to_string(), "dist/".to_string()];
        let rules = IgnoreRules::new(dir.path(), &patterns).unwrap();

        assert!(rules.is_ignored("debug.log", false));
        assert!(!rules.is_ignored("keep.log", false));
        assert!(rules.is_ignored("dist", true));
        assert!(rules.is_ignored("dist/bundle.js", false));
        assert_eq!(rules.configured_patterns(), 3);
    }

    #[test]
    fn builtins_cannot_be_negated() {
        let dir = TempDir::new().unwrap();
        let rules = IgnoreRules::new(dir.path(), &["!node_modules/".to_string()]).unwrap();
        assert!(rules.is_ignored("node_modules/x.js", false));
    }

    #[test]
    fn gitignore_is_optional() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.tmp\n").unwrap();

        let with = IgnoreRules::load(dir.path(), &[], true).unwrap();
        assert!(with.is_ignored("a.tmp", false));

        let without = IgnoreRules::load(dir.path(), &[], false).unwrap();
        assert!(!without.is_ignored("a.tmp", false));
    }
}
