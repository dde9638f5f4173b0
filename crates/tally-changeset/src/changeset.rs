//! The change-set: a batch of pending writes, removals and symlinks.
//!
//! Writes are keyed by path. A later write to the same path replaces the
//! pending one only when it asks to override; otherwise it is dropped. No
//! two pending writes may stand in an ancestor relationship, and that is
//! checked on every insertion. Removals are deduplicated. A repeated symlink
//! is a no-op, and two symlinks at one destination must agree on the source.
//!
//! A change-set may be built with relative paths and then rebased onto an
//! absolute base. Committing requires every path to be absolute.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::commit::{CommitSummary, Committer};
use crate::error::{ChangeSetError, ChangeSetResult};
use crate::target::CommitTarget;

/// A pending file write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOp {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    pub override_existing: bool,
}

/// A pending removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveOp {
    pub path: PathBuf,
    /// Also remove the containing directories left empty by this removal.
    pub remove_empty_parent: bool,
}

/// A pending symlink `dest -> src`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymlinkOp {
    pub src: PathBuf,
    pub dest: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    writes: BTreeMap<PathBuf, WriteOp>,
    removes: Vec<RemoveOp>,
    symlinks: Vec<SymlinkOp>,
    base: Option<PathBuf>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.removes.is_empty() && self.symlinks.is_empty()
    }

    /// Total number of pending operations.
    pub fn len(&self) -> usize {
        self.writes.len() + self.removes.len() + self.symlinks.len()
    }

    /// Pending writes, ordered by path.
    pub fn writes(&self) -> impl Iterator<Item = &WriteOp> {
        self.writes.values()
    }

    pub fn removes(&self) -> &[RemoveOp] {
        &self.removes
    }

    pub fn symlinks(&self) -> &[SymlinkOp] {
        &self.symlinks
    }

    /// The base set by [`ChangeSet::rebase`], if any.
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Queue a file write.
    pub fn add_write(
        &mut self,
        path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
        override_existing: bool,
    ) -> ChangeSetResult<()> {
        let path = path.into();
        if let Some(pending) = self.writes.get_mut(&path) {
            if override_existing {
                pending.contents = contents.into();
                pending.override_existing = true;
            } else {
                debug!(path = %path.display(), "write already pending, keeping the first");
            }
            return Ok(());
        }

        if let Some(existing) = self.colliding_write(&path) {
            return Err(ChangeSetError::PathCollision {
                existing: existing.to_path_buf(),
                new: path,
            });
        }

        self.writes.insert(
            path.clone(),
            WriteOp {
                path,
                contents: contents.into(),
                override_existing,
            },
        );
        Ok(())
    }

    /// A pending write that is an ancestor or a descendant of `path`.
    fn colliding_write(&self, path: &Path) -> Option<&Path> {
        if let Some((ancestor, _)) = path
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .find_map(|a| self.writes.get_key_value(a))
        {
            return Some(ancestor.as_path());
        }
        // Descendants sort directly after `path`.
        self.writes
            .range::<Path, _>((Bound::Excluded(path), Bound::Unbounded))
            .next()
            .map(|(candidate, _)| candidate.as_path())
            .filter(|candidate| candidate.starts_with(path))
    }

    /// Queue a removal. Adding the same request twice is a no-op.
    pub fn add_remove(&mut self, path: impl Into<PathBuf>, remove_empty_parent: bool) {
        let op = RemoveOp {
            path: path.into(),
            remove_empty_parent,
        };
        if !self.removes.contains(&op) {
            self.removes.push(op);
        }
    }

    /// Queue a symlink at `dest` pointing to `src`.
    ///
    /// Queuing the same link twice is a no-op; a second link at `dest`
    /// with another source is a [`ChangeSetError::SymlinkConflict`].
    pub fn add_symlink(
        &mut self,
        src: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
    ) -> ChangeSetResult<()> {
        let (src, dest) = (src.into(), dest.into());
        if src.as_os_str().is_empty() || dest.as_os_str().is_empty() {
            return Err(ChangeSetError::EmptySymlinkPath);
        }
        if let Some(pending) = self.symlinks.iter().find(|op| op.dest == dest) {
            if pending.src == src {
                return Ok(());
            }
            return Err(ChangeSetError::SymlinkConflict {
                dest,
                existing: pending.src.clone(),
                new: src,
            });
        }
        self.symlinks.push(SymlinkOp { src, dest });
        Ok(())
    }

    /// Union `other` into `self` under the single-insertion rules.
    pub fn merge(&mut self, other: ChangeSet) -> ChangeSetResult<()> {
        for write in other.writes.into_values() {
            self.add_write(write.path, write.contents, write.override_existing)?;
        }
        for remove in other.removes {
            self.add_remove(remove.path, remove.remove_empty_parent);
        }
        for link in other.symlinks {
            self.add_symlink(link.src, link.dest)?;
        }
        Ok(())
    }

    /// Join every path onto `base`.
    ///
    /// Fails without changing anything if `base` is relative or if any
    /// pending path is already absolute.
    pub fn rebase(&mut self, base: impl AsRef<Path>) -> ChangeSetResult<()> {
        let base = base.as_ref();
        if !base.is_absolute() {
            return Err(ChangeSetError::RelativeBase(base.to_path_buf()));
        }
        if let Some(absolute) = self.all_paths().find(|p| p.is_absolute()) {
            return Err(ChangeSetError::AlreadyAbsolute(absolute.to_path_buf()));
        }

        self.writes = std::mem::take(&mut self.writes)
            .into_values()
            .map(|mut op| {
                op.path = base.join(&op.path);
                (op.path.clone(), op)
            })
            .collect();
        for op in &mut self.removes {
            op.path = base.join(&op.path);
        }
        for op in &mut self.symlinks {
            op.src = base.join(&op.src);
            op.dest = base.join(&op.dest);
        }
        self.base = Some(base.to_path_buf());
        Ok(())
    }

    /// Check that every path is absolute.
    pub fn validate(&self) -> ChangeSetResult<()> {
        match self.all_paths().find(|p| !p.is_absolute()) {
            Some(relative) => Err(ChangeSetError::NotAbsolute(relative.to_path_buf())),
            None => Ok(()),
        }
    }

    fn all_paths(&self) -> impl Iterator<Item = &Path> {
        self.writes
            .keys()
            .map(PathBuf::as_path)
            .chain(self.removes.iter().map(|op| op.path.as_path()))
            .chain(
                self.symlinks
                    .iter()
                    .flat_map(|op| [op.src.as_path(), op.dest.as_path()]),
            )
    }

    pub(crate) fn into_parts(self) -> (Vec<WriteOp>, Vec<RemoveOp>, Vec<SymlinkOp>) {
        (self.writes.into_values().collect(), self.removes, self.symlinks)
    }

    /// Apply the change-set to `target`. See [`Committer`] for the protocol.
    pub async fn commit(self, target: &dyn CommitTarget) -> ChangeSetResult<CommitSummary> {
        Committer::new(target).commit(self).await
    }
}
