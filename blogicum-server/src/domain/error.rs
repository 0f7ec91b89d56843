use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// Absent, or present but hidden from the caller. Both look the same.
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unexpected domain error: {0}")]
    Unexpected(String),
}

impl DomainError {
    pub(crate) fn post_not_found(post_id: i64) -> Self {
        DomainError::NotFound(format!("post id: {post_id}"))
    }

    pub(crate) fn comment_not_found(comment_id: i64) -> Self {
        DomainError::NotFound(format!("comment id: {comment_id}"))
    }
}
