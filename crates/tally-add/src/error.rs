//! Error types for the add resolver.

use tally_index::IndexError;
use tally_paths::PathError;
use tally_types::TypeError;

/// Broad classification of an [`AddError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// User-correctable input: missing paths, empty directories, bad patterns.
    Input,
    /// The requested identity clashes with what is already tracked.
    IdentityConflict,
    /// An attempt to modify a component owned by dependency resolution.
    Ownership,
    /// Persistence or other internal failures.
    Internal,
}

/// Errors that abort an add. None of them leave a partially updated index.
#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error("no paths given")]
    NoPaths,

    #[error("directory {0} contains no trackable files")]
    EmptyDirectory(String),

    #[error("no files left to track after applying ignore and exclude rules")]
    NoFilesMatched,

    #[error("test file {0} does not exist")]
    MissingTestFile(String),

    #[error(transparent)]
    InvalidId(#[from] TypeError),

    #[error(transparent)]
    Path(#[from] PathError),

    /// A file of an imported component was re-added without naming its id.
    #[error("{path} is tracked by imported component {tracked}; pass --id {tracked} to re-add it")]
    MissingIdForImported { path: String, tracked: String },

    #[error("{path} is tracked by imported component {expected}, but id {supplied} was given")]
    ImportedIdMismatch {
        path: String,
        expected: String,
        supplied: String,
    },

    /// Two candidates of one invocation resolved to the same component.
    #[error("{first} and {second} both resolve to component {id}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    /// One file ended up in two candidates of one invocation.
    #[error("{path} would be tracked by both {first} and {second}")]
    SharedFile {
        path: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl AddError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoPaths
            | Self::EmptyDirectory(_)
            | Self::NoFilesMatched
            | Self::MissingTestFile(_)
            | Self::InvalidId(_)
            | Self::Path(_) => ErrorKind::Input,
            Self::MissingIdForImported { .. }
            | Self::ImportedIdMismatch { .. }
            | Self::DuplicateId { .. }
            | Self::SharedFile { .. } => ErrorKind::IdentityConflict,
            Self::Index(e) if e.is_ownership_violation() => ErrorKind::Ownership,
            Self::Index(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience alias for add results.
pub type AddResult<T> = Result<T, AddError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(AddError::NoFilesMatched.kind(), ErrorKind::Input);
        assert_eq!(
            AddError::Path(PathError::NotFound(vec!["x".into()])).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            AddError::DuplicateId {
                id: "a/b".into(),
                first: "a".into(),
                second: "b".into()
            }
            .kind(),
            ErrorKind::IdentityConflict
        );
        assert_eq!(
            AddError::Index(IndexError::NestedOwnership { id: "a/b".into() }).kind(),
            ErrorKind::Ownership
        );
        assert_eq!(
            AddError::Index(IndexError::Serialization("bad".into())).kind(),
            ErrorKind::Internal
        );
    }
}
