use crate::domain::error::DomainError;

pub(crate) mod category_repository;
pub(crate) mod comment_repository;
pub(crate) mod post_repository;
pub(crate) mod user_repository;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a foreign key violation to `NotFound` naming the missing referent.
pub(crate) fn map_foreign_key_violation(
    err: &sqlx::Error,
    referent: impl FnOnce(Option<&str>) -> &'static str,
) -> Option<DomainError> {
    if let sqlx::Error::Database(db_err) = err
        && db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    {
        return Some(DomainError::NotFound(referent(db_err.constraint()).to_string()));
    }
    None
}

/// Maps a unique violation to `AlreadyExists` naming the clashing field.
pub(crate) fn map_unique_violation(
    err: &sqlx::Error,
    field: impl FnOnce(Option<&str>) -> &'static str,
) -> Option<DomainError> {
    if let sqlx::Error::Database(db_err) = err
        && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
    {
        return Some(DomainError::AlreadyExists(field(db_err.constraint()).to_string()));
    }
    None
}
