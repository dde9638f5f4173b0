//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The target entry is owned by dependency resolution.
    #[error("component {id} is nested (owned by dependency resolution) and cannot be modified directly")]
    NestedOwnership { id: String },

    /// A file belongs to a nested entry and cannot be reassigned.
    #[error("file {path} belongs to nested component {owner} and cannot be reassigned")]
    NestedFile { path: String, owner: String },

    /// A path is mapped by more than one entry.
    #[error("file {path} is tracked by both {first} and {second}")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    /// A persisted entry could not be interpreted.
    #[error("corrupt index entry {key:?}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the persistence backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Whether this error is an ownership violation (touching a nested entry).
    pub fn is_ownership_violation(&self) -> bool {
        matches!(self, Self::NestedOwnership { .. } | Self::NestedFile { .. })
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
