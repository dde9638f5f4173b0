//! The commit protocol.
//!
//! Phases run in strict order and a phase starts only after every task of
//! the previous one has finished:
//!
//! 1. **validate**: every path must be absolute; nothing is touched otherwise
//! 2. **remove**: all removals concurrently, then the pruning pass. A removal
//!    inside another pending removal is covered by it and not run on its own.
//! 3. **install**: package installer requests, one after another
//! 4. **write**: all writes concurrently
//! 5. **symlink**: all symlinks concurrently
//!
//! Within a concurrent phase every task is awaited, then the first error
//! (in submission order) is returned and later phases do not run.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, info};

use crate::changeset::{ChangeSet, RemoveOp};
use crate::error::{ChangeSetError, ChangeSetResult, TargetError};
use crate::installer::{InstallRequest, PackageInstaller};
use crate::target::{CommitTarget, RemoveMode};

/// What a commit did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Removals that found something to remove.
    pub removed: usize,
    /// Directories removed by the pruning pass, deepest first.
    pub pruned: Vec<PathBuf>,
    pub installs: usize,
    pub written: usize,
    pub linked: usize,
}

/// Applies a [`ChangeSet`] to a [`CommitTarget`].
pub struct Committer<'a> {
    target: &'a dyn CommitTarget,
    installer: Option<&'a dyn PackageInstaller>,
    installs: Vec<InstallRequest>,
}

impl<'a> Committer<'a> {
    pub fn new(target: &'a dyn CommitTarget) -> Self {
        Self {
            target,
            installer: None,
            installs: Vec::new(),
        }
    }

    /// Run `requests` through `installer` after the remove phase and
    /// before the write phase.
    pub fn with_installs(
        mut self,
        installer: &'a dyn PackageInstaller,
        requests: Vec<InstallRequest>,
    ) -> Self {
        self.installer = Some(installer);
        self.installs = requests;
        self
    }

    pub async fn commit(&self, changes: ChangeSet) -> ChangeSetResult<CommitSummary> {
        changes.validate()?;
        let boundary = changes.base().map(Path::to_path_buf);
        let (writes, removes, symlinks) = changes.into_parts();
        let mut summary = CommitSummary::default();

        let roots = removal_roots(&removes);
        debug!(count = roots.len(), requested = removes.len(), "remove phase");
        let removed = run_batch(
            roots
                .iter()
                .map(|path| self.target.remove_path(path, RemoveMode::Any)),
        )
        .await?;
        summary.removed = removed.into_iter().filter(|hit| *hit).count();
        summary.pruned = self.prune(&removes, boundary.as_deref()).await?;

        if let Some(installer) = self.installer {
            debug!(count = self.installs.len(), "install phase");
            for request in &self.installs {
                let output = installer.install(request).await?;
                debug!(tool = %request.tool_name, stdout = %output.stdout.trim_end(), "install finished");
                summary.installs += 1;
            }
        }

        debug!(count = writes.len(), "write phase");
        run_batch(
            writes
                .iter()
                .map(|op| self.target.write_file(&op.path, &op.contents)),
        )
        .await?;
        summary.written = writes.len();

        debug!(count = symlinks.len(), "symlink phase");
        run_batch(
            symlinks
                .iter()
                .map(|op| self.target.symlink(&op.src, &op.dest)),
        )
        .await?;
        summary.linked = symlinks.len();

        info!(
            removed = summary.removed,
            pruned = summary.pruned.len(),
            written = summary.written,
            linked = summary.linked,
            "change-set committed"
        );
        Ok(summary)
    }

    /// Remove directories left empty by pruning removals, deepest first.
    ///
    /// With a boundary (the rebase base) pruning walks up to, but never
    /// removes, the boundary. Without one only the direct parent is tried.
    async fn prune(
        &self,
        removes: &[RemoveOp],
        boundary: Option<&Path>,
    ) -> ChangeSetResult<Vec<PathBuf>> {
        let within = |dir: &Path| match boundary {
            Some(stop) => dir != stop && dir.starts_with(stop),
            None => dir.parent().is_some(),
        };

        let mut pending: BTreeSet<(usize, PathBuf)> = removes
            .iter()
            .filter(|op| op.remove_empty_parent)
            .filter_map(|op| op.path.parent())
            .filter(|dir| within(dir))
            .map(|dir| (depth(dir), dir.to_path_buf()))
            .collect();

        let mut pruned = Vec::new();
        while let Some((_, dir)) = pending.pop_last() {
            if !self.target.remove_path(&dir, RemoveMode::EmptyDirOnly).await? {
                continue;
            }
            debug!(dir = %dir.display(), "pruned empty directory");
            if boundary.is_some() {
                if let Some(parent) = dir.parent().filter(|p| within(p)) {
                    pending.insert((depth(parent), parent.to_path_buf()));
                }
            }
            pruned.push(dir);
        }
        Ok(pruned)
    }
}

/// Distinct removal paths with no ancestor among the other removals.
fn removal_roots(removes: &[RemoveOp]) -> Vec<&Path> {
    let all: BTreeSet<&Path> = removes.iter().map(|op| op.path.as_path()).collect();
    all.iter()
        .copied()
        .filter(|path| !path.ancestors().skip(1).any(|a| all.contains(a)))
        .collect()
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Await every task, then surface the first failure.
async fn run_batch<I, F, T>(tasks: I) -> ChangeSetResult<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, TargetError>>,
{
    join_all(tasks)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(ChangeSetError::from)
}
