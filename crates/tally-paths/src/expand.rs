//! Pattern expansion against the working tree.

use std::collections::BTreeSet;
use std::path::Path;

use glob::MatchOptions;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PathError, PathResult};
use crate::normalize::{is_glob, normalize_str, relative_to_root};
use crate::rules::IgnoreRules;

/// Expand a workspace-relative pattern into the set of matching files.
///
/// - a glob pattern matches files only;
/// - a plain path to a file yields that file;
/// - a plain path to a directory yields every file beneath it.
///
/// Ignored paths are filtered out. A pattern matching nothing yields an empty
/// set rather than an error.
pub fn expand(root: &Path, pattern: &str, ignore: &IgnoreRules) -> PathResult<BTreeSet<String>> {
    if is_glob(pattern) {
        return expand_glob(root, pattern, ignore);
    }

    let relative = normalize_str(pattern)?;
    let absolute = root.join(&relative);
    if absolute.is_file() {
        let mut out = BTreeSet::new();
        if !ignore.is_ignored(&relative, false) {
            out.insert(relative);
        }
        Ok(out)
    } else if absolute.is_dir() {
        walk_dir(root, &relative, ignore)
    } else {
        Ok(BTreeSet::new())
    }
}

fn expand_glob(root: &Path, pattern: &str, ignore: &IgnoreRules) -> PathResult<BTreeSet<String>> {
    let relative = normalize_str(pattern)?;
    let anchored = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        relative
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let paths = glob::glob_with(&anchored, options).map_err(|e| PathError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;

    let mut out = BTreeSet::new();
    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                debug!(error = %e, "skipping unreadable glob match");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let relative = relative_to_root(root, &path)?;
        if !ignore.is_ignored(&relative, false) {
            out.insert(relative);
        }
    }
    debug!(pattern, matched = out.len(), "glob expanded");
    Ok(out)
}

/// All non-ignored files beneath the workspace-relative directory `dir`.
///
/// Ignored directories are pruned without being descended into.
pub fn walk_dir(root: &Path, dir: &str, ignore: &IgnoreRules) -> PathResult<BTreeSet<String>> {
    let start = root.join(dir);
    let walker = WalkDir::new(&start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match relative_to_root(root, entry.path()) {
                Ok(relative) => !ignore.is_ignored(&relative, entry.file_type().is_dir()),
                Err(_) => false,
            }
        });

    let mut out = BTreeSet::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            out.insert(relative_to_root(root, entry.path())?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, file.as_bytes()).unwrap();
        }
        dir
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn glob_matches_files_only() {
        let ws = workspace(&["src/a.js", "src/b.js", "src/c.ts", "src/deep/d.js"]);
        let rules = IgnoreRules::builtin(ws.path()).unwrap();

        assert_eq!(expand(ws.path(), "src/*.js", &rules).unwrap(), set(&["src/a.js", "src/b.js"]));
        assert_eq!(
            expand(ws.path(), "src/**/*.js", &rules).unwrap(),
            set(&["src/a.js", "src/b.js", "src/deep/d.js"])
        );
    }

    #[test]
    fn plain_paths_expand_to_file_or_tree() {
        let ws = workspace(&["lib/x.rs", "lib/sub/y.rs"]);
        let rules = IgnoreRules::builtin(ws.path()).unwrap();

        assert_eq!(expand(ws.path(), "lib/x.rs", &rules).unwrap(), set(&["lib/x.rs"]));
        assert_eq!(expand(ws.path(), "./lib", &rules).unwrap(), set(&["lib/sub/y.rs", "lib/x.rs"]));
    }

    #[test]
    fn missing_pattern_is_empty_not_error() {
        let ws = workspace(&["a.js"]);
        let rules = IgnoreRules::builtin(ws.path()).unwrap();
        assert!(expand(ws.path(), "nope/*.js", &rules).unwrap().is_empty());
        assert!(expand(ws.path(), "nope.js", &rules).unwrap().is_empty());
    }

    #[test]
    fn ignored_paths_are_filtered() {
        let ws = workspace(&["pkg/index.js", "pkg/node_modules/dep/index.js", "pkg/debug.log"]);
        let rules = IgnoreRules::new(ws.path(), &["*.log".to_string()]).unwrap();

        assert_eq!(walk_dir(ws.path(), "pkg", &rules).unwrap(), set(&["pkg/index.js"]));
        assert_eq!(expand(ws.path(), "pkg/**/*", &rules).unwrap(), set(&["pkg/index.js"]));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let ws = workspace(&[]);
        let rules = IgnoreRules::builtin(ws.path()).unwrap();
        assert!(matches!(
            expand(ws.path(), "src/[a.js", &rules),
            Err(PathError::InvalidGlob { .. })
        ));
    }
}
