use chrono::{DateTime, Utc};

use super::error::DomainError;
use super::user::Author;

const TEXT_MAX_CHARS: usize = 10_000;

#[derive(Debug, Clone)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) post_id: i64,
    pub(crate) author: Author,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct CommentForm {
    pub(crate) text: String,
}

impl CommentForm {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation {
                field: "text",
                message: "must not be empty",
            });
        }
        if text.chars().count() > TEXT_MAX_CHARS {
            return Err(DomainError::Validation {
                field: "text",
                message: "must be at most 10000 chars",
            });
        }
        Ok(Self {
            text: text.to_string(),
        })
    }
}
