use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid component id {input:?}: {reason}")]
    InvalidId { input: String, reason: String },

    #[error("unknown origin: {0}")]
    UnknownOrigin(String),
}

impl TypeError {
    pub(crate) fn invalid_id(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
