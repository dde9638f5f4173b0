use std::path::Path;

use async_trait::async_trait;

use crate::error::TargetResult;

/// How [`CommitTarget::remove_path`] treats what it finds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveMode {
    /// Remove a file, symlink or whole directory tree.
    Any,
    /// Remove only an empty directory; anything else is left alone.
    EmptyDirOnly,
}

/// Where a change-set is applied: the local filesystem or an isolated
/// environment exposing the same three primitives.
///
/// Implementations must tolerate concurrent calls for disjoint paths.
#[async_trait]
pub trait CommitTarget: Send + Sync {
    /// Write `contents` to `path`, creating missing parent directories and
    /// replacing an existing file.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> TargetResult<()>;

    /// Remove `path`. Returns `false` when there was nothing to remove
    /// (or, under [`RemoveMode::EmptyDirOnly`], nothing removable).
    async fn remove_path(&self, path: &Path, mode: RemoveMode) -> TargetResult<bool>;

    /// Create a symlink at `dest` pointing to `src`.
    async fn symlink(&self, src: &Path, dest: &Path) -> TargetResult<()>;
}
