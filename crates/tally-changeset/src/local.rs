//! Local filesystem commit target.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{TargetError, TargetResult};
use crate::target::{CommitTarget, RemoveMode};

/// Applies change-sets to the local filesystem with `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFsTarget;

impl LocalFsTarget {
    pub fn new() -> Self {
        Self
    }
}

async fn ensure_parent(path: &Path) -> TargetResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TargetError::io("create directory", parent, e))?;
        }
    }
    Ok(())
}

/// Map a removal result, where a path that is already gone is a miss.
fn removed(result: std::io::Result<()>, op: &'static str, path: &Path) -> TargetResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(TargetError::io(op, path, e)),
    }
}

async fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Whether `dest` is already a symlink to `src`.
async fn links_to(dest: &Path, src: &Path) -> bool {
    fs::read_link(dest).await.map(|target| target == src).unwrap_or(false)
}

#[async_trait]
impl CommitTarget for LocalFsTarget {
    async fn write_file(&self, path: &Path, contents: &[u8]) -> TargetResult<()> {
        ensure_parent(path).await?;
        // Replace a symlink rather than writing through it.
        if is_symlink(path).await {
            removed(fs::remove_file(path).await, "replace symlink", path)?;
        }
        fs::write(path, contents)
            .await
            .map_err(|e| TargetError::io("write", path, e))
    }

    async fn remove_path(&self, path: &Path, mode: RemoveMode) -> TargetResult<bool> {
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(TargetError::io("stat", path, e)),
        };

        match mode {
            RemoveMode::Any if meta.is_dir() => {
                removed(fs::remove_dir_all(path).await, "remove directory", path)
            }
            RemoveMode::Any => removed(fs::remove_file(path).await, "remove", path),
            RemoveMode::EmptyDirOnly => {
                if !meta.is_dir() {
                    return Ok(false);
                }
                let mut entries = match fs::read_dir(path).await {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
                    Err(e) => return Err(TargetError::io("read directory", path, e)),
                };
                let has_entries = entries
                    .next_entry()
                    .await
                    .map_err(|e| TargetError::io("read directory", path, e))?
                    .is_some();
                if has_entries {
                    return Ok(false);
                }
                removed(fs::remove_dir(path).await, "remove directory", path)
            }
        }
    }

    async fn symlink(&self, src: &Path, dest: &Path) -> TargetResult<()> {
        ensure_parent(dest).await?;
        if let Ok(meta) = fs::symlink_metadata(dest).await {
            if !meta.file_type().is_symlink() {
                return Err(TargetError::AlreadyExists(dest.to_path_buf()));
            }
            if links_to(dest, src).await {
                return Ok(());
            }
            removed(fs::remove_file(dest).await, "replace symlink", dest)?;
        }
        match create_symlink(src, dest).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && links_to(dest, src).await => Ok(()),
            Err(e) => Err(TargetError::io("symlink", dest, e)),
        }
    }
}

#[cfg(unix)]
async fn create_symlink(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::symlink(src, dest).await
}

#[cfg(windows)]
async fn create_symlink(src: &Path, dest: &Path) -> std::io::Result<()> {
    let is_dir = fs::metadata(src).await.map(|m| m.is_dir()).unwrap_or(false);
    if is_dir {
        fs::symlink_dir(src, dest).await
    } else {
        fs::symlink_file(src, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        LocalFsTarget.write_file(&path, b"hello").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn remove_modes() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(tree.join("inner")).unwrap();
        std::fs::write(tree.join("inner/file"), "x").unwrap();

        let target = LocalFsTarget::new();
        assert!(!target.remove_path(&tree, RemoveMode::EmptyDirOnly).await.unwrap());
        assert!(target.remove_path(&tree, RemoveMode::Any).await.unwrap());
        assert!(!tree.exists());
        assert!(!target.remove_path(&tree, RemoveMode::Any).await.unwrap());

        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        assert!(target.remove_path(&empty, RemoveMode::EmptyDirOnly).await.unwrap());
        assert!(!empty.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_replaces_symlink_but_not_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let other = dir.path().join("other.txt");
        std::fs::write(&src, "src").unwrap();
        std::fs::write(&other, "other").unwrap();
        let link = dir.path().join("links/link.txt");

        let target = LocalFsTarget::new();
        target.symlink(&other, &link).await.unwrap();
        target.symlink(&src, &link).await.unwrap();
        assert_eq!(std::fs::read_link(&link).unwrap(), src);

        let err = target.symlink(&src, &other).await.unwrap_err();
        assert!(matches!(err, TargetError::AlreadyExists(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_to_the_same_source_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        std::fs::write(&src, "src").unwrap();
        let link = dir.path().join("link.txt");

        let target = LocalFsTarget::new();
        target.symlink(&src, &link).await.unwrap();
        target.symlink(&src, &link).await.unwrap();
        assert_eq!(std::fs::read_link(&link).unwrap(), src);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn write_replaces_symlink_instead_of_following_it() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("source.js");
        std::fs::write(&src, "original").unwrap();
        let link = dir.path().join("out/source.js");
        std::fs::create_dir_all(link.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(&src, &link).unwrap();

        LocalFsTarget.write_file(&link, b"copy").await.unwrap();

        assert_eq!(std::fs::read_to_string(&src).unwrap(), "original");
        assert!(!std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "copy");
    }

    #[tokio::test]
    async fn removing_a_vanished_path_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        assert!(!removed(std::fs::remove_file(&gone), "remove", &gone).unwrap());
        assert!(!LocalFsTarget.remove_path(&gone, RemoveMode::EmptyDirOnly).await.unwrap());
    }
}
