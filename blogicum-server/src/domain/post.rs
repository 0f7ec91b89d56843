use chrono::{DateTime, Utc};

use super::category::Category;
use super::error::DomainError;
use super::location::Location;
use super::user::Author;

const TITLE_MAX_CHARS: usize = 256;
const IMAGE_MAX_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) is_published: bool,
    pub(crate) author: Author,
    pub(crate) category: Option<Category>,
    pub(crate) location: Option<Location>,
    pub(crate) image: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

/// A post together with the number of comments it has at query time.
#[derive(Debug, Clone)]
pub(crate) struct AnnotatedPost {
    pub(crate) post: Post,
    pub(crate) comment_count: i64,
}

/// Submitted post fields, shared by create and edit.
///
/// On create a missing `pub_date` means "now" and a missing `is_published`
/// means `true`. On edit both keep the stored value.
#[derive(Debug, Clone)]
pub(crate) struct PostForm {
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) pub_date: Option<DateTime<Utc>>,
    pub(crate) is_published: Option<bool>,
    pub(crate) category_id: Option<i64>,
    pub(crate) location_id: Option<i64>,
    pub(crate) image: Option<String>,
}

impl PostForm {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if let Some(category_id) = self.category_id {
            validate_positive_i64("category_id", category_id)?;
        }
        if let Some(location_id) = self.location_id {
            validate_positive_i64("location_id", location_id)?;
        }

        Ok(Self {
            title: normalize_title(&self.title)?,
            text: normalize_text(&self.text)?,
            image: normalize_image(self.image)?,
            ..self
        })
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..256 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "must not be empty",
        });
    }
    Ok(text.to_string())
}

fn normalize_image(image: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(image) = image else {
        return Ok(None);
    };
    let image = image.trim();
    if image.is_empty() {
        return Ok(None);
    }
    if image.chars().count() > IMAGE_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "image",
            message: "must be at most 512 chars",
        });
    }
    Ok(Some(image.to_string()))
}
