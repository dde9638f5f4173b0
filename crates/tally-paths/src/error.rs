//! Error types for the path utilities.

/// Errors that can occur while resolving, expanding, or templating paths.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// One or more explicitly supplied paths do not exist.
    #[error("path does not exist: {}", .0.join(", "))]
    NotFound(Vec<String>),

    /// The path lies outside the workspace root.
    #[error("path is outside the workspace root: {0}")]
    OutsideRoot(String),

    /// The workspace root itself cannot be tracked as a component.
    #[error("the workspace root cannot be added as a component")]
    RootNotAllowed,

    /// An absolute path was given where a workspace-relative one is required.
    #[error("expected a workspace-relative path, got absolute path: {0}")]
    Absolute(String),

    /// A relative path climbs above the workspace root.
    #[error("path escapes the workspace root: {0}")]
    Escapes(String),

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidGlob { pattern: String, reason: String },

    /// A template references a placeholder outside the grammar.
    #[error("unknown placeholder {{{placeholder}}} in template {template:?}")]
    UnknownPlaceholder { template: String, placeholder: String },

    /// A template opens a placeholder without closing it.
    #[error("unterminated placeholder in template {0:?}")]
    UnterminatedPlaceholder(String),

    /// `{ext}` was rendered for a file that has no extension.
    #[error("template {template:?} uses {{ext}} but {path} has no extension")]
    MissingExtension { template: String, path: String },

    /// Ignore rules could not be built.
    #[error("ignore rules: {0}")]
    Ignore(#[from] ignore::Error),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for path results.
pub type PathResult<T> = Result<T, PathError>;
