//! Workspace-relative path normalization.
//!
//! Every path stored by tally is relative to the workspace root, uses `/` as
//! the separator, and contains no `.`/`..`/empty segments.

use std::path::Path;

use crate::error::{PathError, PathResult};

/// Normalize a workspace-relative path string.
///
/// Backslashes are treated as separators, `.` and empty segments are dropped,
/// and `..` pops the previous segment. Absolute paths and paths that climb
/// above the root are rejected. The workspace root itself normalizes to `""`.
pub fn normalize_str(input: &str) -> PathResult<String> {
    let unified = input.replace('\\', "/");
    if unified.starts_with('/') || Path::new(input).is_absolute() {
        return Err(PathError::Absolute(input.to_string()));
    }
    collapse(&unified).ok_or_else(|| PathError::Escapes(input.to_string()))
}

/// Normalize a relative [`Path`]. See [`normalize_str`].
pub fn normalize_relative(path: &Path) -> PathResult<String> {
    normalize_str(&path.to_string_lossy())
}

/// Express an absolute path relative to `root`.
pub fn relative_to_root(root: &Path, path: &Path) -> PathResult<String> {
    let display = path.display().to_string();
    let stripped = path
        .strip_prefix(root)
        .map_err(|_| PathError::OutsideRoot(display.clone()))?;
    let unified = stripped.to_string_lossy().replace('\\', "/");
    collapse(&unified).ok_or(PathError::OutsideRoot(display))
}

/// Join two normalized relative paths.
pub fn join_relative(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{rest}"),
    }
}

/// Parent directory of a normalized relative path (`""` at the root).
pub fn parent_of(relative: &str) -> &str {
    relative.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Last segment of a normalized relative path.
pub fn last_segment(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

/// Whether `s` contains glob metacharacters.
pub fn is_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Collapse segments; `None` when `..` climbs above the start.
pub(crate) fn collapse(unified: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalizes_separators_and_dots() {
        assert_eq!(normalize_str("./src//utils/./a.js").unwrap(), "src/utils/a.js");
        assert_eq!(normalize_str("src\\b.js").unwrap(), "src/b.js");
        assert_eq!(normalize_str("src/x/../b.js").unwrap(), "src/b.js");
        assert_eq!(normalize_str(".").unwrap(), "");
        assert_eq!(normalize_relative(Path::new("src/./a.js")).unwrap(), "src/a.js");
    }

    #[test]
    fn rejects_absolute_and_escaping_paths() {
        assert!(matches!(normalize_str("/etc/passwd"), Err(PathError::Absolute(_))));
        assert!(matches!(normalize_str("../outside"), Err(PathError::Escapes(_))));
        assert!(matches!(normalize_str("a/../../b"), Err(PathError::Escapes(_))));
    }

    #[test]
    fn relative_to_root_strips_prefix() {
        let root = PathBuf::from("/ws");
        assert_eq!(relative_to_root(&root, Path::new("/ws/src/a.js")).unwrap(), "src/a.js");
        assert_eq!(relative_to_root(&root, Path::new("/ws")).unwrap(), "");
        assert!(matches!(
            relative_to_root(&root, Path::new("/elsewhere/a.js")),
            Err(PathError::OutsideRoot(_))
        ));
        assert!(matches!(
            relative_to_root(&root, Path::new("/ws/../elsewhere")),
            Err(PathError::OutsideRoot(_))
        ));
    }

    #[test]
    fn segment_helpers() {
        assert_eq!(parent_of("src/utils/a.js"), "src/utils");
        assert_eq!(parent_of("a.js"), "");
        assert_eq!(last_segment("src/utils"), "utils");
        assert_eq!(join_relative("", "a.js"), "a.js");
        assert_eq!(join_relative("src", "a.js"), "src/a.js");
        assert!(is_glob("src/**/*.js"));
        assert!(!is_glob("src/a.js"));
    }
}
