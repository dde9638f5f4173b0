//! Error types for the change-set engine.

use std::io;
use std::path::PathBuf;

/// Errors raised by a [`CommitTarget`](crate::CommitTarget) primitive.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The target refused the operation.
    #[error("{}: {reason}", path.display())]
    Rejected { path: PathBuf, reason: String },
}

impl TargetError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by a [`PackageInstaller`](crate::PackageInstaller).
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("could not run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and failed; `stderr` is its raw error output.
    #[error("{tool} exited with {status}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
}

impl InstallError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            Self::Spawn { .. } => None,
        }
    }
}

/// Errors that can occur while building or committing a change-set.
#[derive(Debug, thiserror::Error)]
pub enum ChangeSetError {
    /// Two pending writes where one path is a directory prefix of the other.
    #[error("cannot write both {} and {}: one is inside the other", existing.display(), new.display())]
    PathCollision { existing: PathBuf, new: PathBuf },

    #[error("path {} is not absolute; rebase the change-set before committing", .0.display())]
    NotAbsolute(PathBuf),

    #[error("cannot rebase: path {} is already absolute", .0.display())]
    AlreadyAbsolute(PathBuf),

    #[error("rebase base {} is not absolute", .0.display())]
    RelativeBase(PathBuf),

    #[error("symlink source and destination must both be non-empty")]
    EmptySymlinkPath,

    /// Two pending symlinks at one destination with different sources.
    #[error("symlink {} cannot point to both {} and {}", dest.display(), existing.display(), new.display())]
    SymlinkConflict {
        dest: PathBuf,
        existing: PathBuf,
        new: PathBuf,
    },

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("install step failed: {0}")]
    Install(#[from] InstallError),
}

impl ChangeSetError {
    /// Whether this error means the change-set itself was built wrongly,
    /// as opposed to a failure while applying it.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::PathCollision { .. }
                | Self::NotAbsolute(_)
                | Self::AlreadyAbsolute(_)
                | Self::RelativeBase(_)
                | Self::EmptySymlinkPath
                | Self::SymlinkConflict { .. }
        )
    }
}

/// Result alias for target primitives.
pub type TargetResult<T> = Result<T, TargetError>;

/// Convenience alias for change-set results.
pub type ChangeSetResult<T> = Result<T, ChangeSetError>;
