use axum::{
    Json,
    extract::{Path, State},
    response::{Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::comment::{Comment, CommentForm};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::handlers::posts::AuthorDto;
use crate::presentation::http::handlers::{prefill_or_redirect, redirect_after};
use crate::presentation::http::middleware::auth::AuthenticatedUser;
use crate::presentation::http::urls;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CommentFormDto {
    #[validate(length(min = 1, max = 10000))]
    pub(crate) text: String,
}

impl From<CommentFormDto> for CommentForm {
    fn from(dto: CommentFormDto) -> Self {
        Self { text: dto.text }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) post_id: i64,
    pub(crate) author: AuthorDto,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            post_id: comment.post_id,
            author: comment.author.into(),
            created_at: comment.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment/",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id")
    ),
    request_body = CommentFormDto,
    responses(
        (status = 303, description = "Comment added; redirects to the post detail"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post missing or hidden from the commenter"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
    Json(dto): Json<CommentFormDto>,
) -> AppResult<Redirect> {
    dto.validate()?;

    state
        .blog_service
        .add_comment(auth.user_id, post_id, dto.into())
        .await?;
    Ok(Redirect::to(&urls::post_detail(post_id)))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit_comment/{comment_id}/",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Current comment", body = CommentDto),
        (status = 303, description = "Not the author; redirects to the post detail"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Comment not found under this post"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn edit_comment_form(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Response> {
    let outcome = state
        .blog_service
        .get_comment_for_edit(auth.user_id, post_id, comment_id)
        .await?;

    Ok(prefill_or_redirect::<_, CommentDto>(outcome, post_id))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit_comment/{comment_id}/",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = CommentFormDto,
    responses(
        (status = 303, description = "Updated, or not the author; redirects to the post detail"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Comment not found under this post"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn edit_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(dto): Json<CommentFormDto>,
) -> AppResult<Response> {
    let outcome = state
        .blog_service
        .update_comment(auth.user_id, post_id, comment_id, dto.into())
        .await?;
    Ok(redirect_after(outcome, post_id, |comment| urls::post_detail(comment.post_id)))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete_comment/{comment_id}/",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 303, description = "Deleted, or not the author; redirects to the post detail"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Comment not found under this post"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Response> {
    let outcome = state
        .blog_service
        .delete_comment(auth.user_id, post_id, comment_id)
        .await?;

    Ok(redirect_after(outcome, post_id, |()| urls::post_detail(post_id)))
}
