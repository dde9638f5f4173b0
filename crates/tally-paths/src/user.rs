//! Resolution of explicitly user-supplied paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{PathError, PathResult};
use crate::expand::expand;
use crate::normalize::{is_glob, join_relative, relative_to_root};
use crate::rules::IgnoreRules;

/// Whether a user path names a file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// A user-supplied path, validated and expressed relative to the workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPath {
    /// The text the user typed.
    pub input: String,
    /// Normalized workspace-relative path.
    pub relative: String,
    pub kind: PathKind,
}

/// Validate and classify user paths.
///
/// Relative inputs are resolved against `cwd`. Glob inputs expand to the
/// files they match. Every input that does not exist (or whose glob matches
/// nothing) is collected into a single [`PathError::NotFound`].
pub fn resolve_user_paths(
    root: &Path,
    cwd: &Path,
    inputs: &[PathBuf],
    ignore: &IgnoreRules,
) -> PathResult<Vec<UserPath>> {
    let mut resolved = Vec::new();
    let mut seen = BTreeSet::new();
    let mut missing = Vec::new();

    for input in inputs {
        let text = input.to_string_lossy().to_string();

        if is_glob(&text) {
            let cwd_relative = relative_to_root(root, cwd)?;
            let matches = expand(root, &join_relative(&cwd_relative, &text), ignore)?;
            if matches.is_empty() {
                missing.push(text);
                continue;
            }
            for relative in matches {
                if seen.insert(relative.clone()) {
                    resolved.push(UserPath {
                        input: text.clone(),
                        relative,
                        kind: PathKind::File,
                    });
                }
            }
            continue;
        }

        let absolute = if input.is_absolute() {
            input.clone()
        } else {
            cwd.join(input)
        };
        if !absolute.exists() {
            missing.push(text);
            continue;
        }

        let relative = relative_to_root(root, &absolute)?;
        if relative.is_empty() {
            return Err(PathError::RootNotAllowed);
        }
        let kind = if absolute.is_dir() {
            PathKind::Directory
        } else {
            PathKind::File
        };
        if seen.insert(relative.clone()) {
            resolved.push(UserPath {
                input: text,
                relative,
                kind,
            });
        }
    }

    if !missing.is_empty() {
        return Err(PathError::NotFound(missing));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/utils")).unwrap();
        fs::write(dir.path().join("src/utils/a.js"), "a").unwrap();
        fs::write(dir.path().join("src/utils/b.js"), "b").unwrap();
        fs::write(dir.path().join("src/main.js"), "m").unwrap();
        dir
    }

    #[test]
    fn classifies_files_and_directories() {
        let ws = workspace();
        let rules = IgnoreRules::builtin(ws.path()).unwrap();
        let paths = resolve_user_paths(
            ws.path(),
            ws.path(),
            &[PathBuf::from("src/utils"), PathBuf::from("src/main.js")],
            &rules,
        )
        .unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].relative, "src/utils");
        assert_eq!(paths[0].kind, PathKind::Directory);
        assert_eq!(paths[1].relative, "src/main.js");
        assert_eq!(paths[1].kind, PathKind::File);
    }

    #[test]
    fn resolves_relative_to_cwd() {
        let ws = workspace();
        let rules = IgnoreRules::builtin(ws.path()).unwrap();
        let cwd = ws.path().join("src");
        let paths =
            resolve_user_paths(ws.path(), &cwd, &[PathBuf::from("utils/*.js")], &rules).unwrap();
        let rels: Vec<_> = paths.iter().map(|p| p.relative.as_str()).collect();
        assert_eq!(rels, vec!["src/utils/a.js", "src/utils/b.js"]);
    }

    #[test]
    fn reports_every_missing_path() {
        let ws = workspace();
        let rules = IgnoreRules::builtin(ws.path()).unwrap();
        let err = resolve_user_paths(
            ws.path(),
            ws.path(),
            &[
                PathBuf::from("src/main.js"),
                PathBuf::from("gone.js"),
                PathBuf::from("nothing/*.ts"),
            ],
            &rules,
        )
        .unwrap_err();

        match err {
            PathError::NotFound(paths) => assert_eq!(paths, vec!["gone.js", "nothing/*.ts"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_root_and_outside_paths() {
        let ws = workspace();
        let rules = IgnoreRules::builtin(ws.path()).unwrap();
        assert!(matches!(
            resolve_user_paths(ws.path(), ws.path(), &[PathBuf::from(".")], &rules),
            Err(PathError::RootNotAllowed)
        ));

        let outside = TempDir::new().unwrap();
        assert!(matches!(
            resolve_user_paths(ws.path(), ws.path(), &[outside.path().to_path_buf()], &rules),
            Err(PathError::OutsideRoot(_))
        ));
    }
}
