use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: FieldErrors,
}

impl ErrorBody {
    fn plain(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: FieldErrors::new(),
        }
    }
}

fn validation_fields(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|err| {
                    err.message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| err.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => match err {
                DomainError::Validation { field, message } => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: "validation failed".to_string(),
                        fields: FieldErrors::from([(field.to_string(), vec![message.to_string()])]),
                    },
                ),
                DomainError::AlreadyExists(_) => {
                    (StatusCode::CONFLICT, ErrorBody::plain(err.to_string()))
                }
                DomainError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, ErrorBody::plain(err.to_string()))
                }
                // no detail: a hidden post must look like a missing one
                DomainError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::plain("not found")),
                DomainError::Unexpected(detail) => {
                    error!(%detail, "unexpected domain error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorBody::plain("internal error"),
                    )
                }
            },
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation failed".to_string(),
                    fields: validation_fields(&err),
                },
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::plain("unauthorized")),
            AppError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::plain("internal error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use validator::Validate;

    use super::{AppError, validation_fields};
    use crate::domain::error::DomainError;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "must not be empty"))]
        text: String,
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (
                DomainError::Validation {
                    field: "title",
                    message: "bad",
                },
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::NotFound("post id: 1".to_string()), StatusCode::NOT_FOUND),
            (DomainError::AlreadyExists("username".to_string()), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                DomainError::Unexpected("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn validator_errors_are_reported_per_field() {
        let errors = Sample {
            text: String::new(),
        }
        .validate()
        .expect_err("empty text must fail");

        let fields = validation_fields(&errors);
        assert_eq!(fields["text"], vec!["must not be empty".to_string()]);
        assert_eq!(
            AppError::from(errors).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
