use axum::response::{IntoResponse, Redirect, Response};

use crate::application::blog_service::Mutation;
use crate::presentation::http::urls;

pub(crate) mod auth;
pub(crate) mod comments;
pub(crate) mod health;
pub(crate) mod posts;
pub(crate) mod profile;

/// `303 See Other` to wherever the mutation leads. A denied mutation always
/// lands on the post detail.
pub(crate) fn redirect_after<T>(
    outcome: Mutation<T>,
    post_id: i64,
    on_applied: impl FnOnce(T) -> String,
) -> Response {
    let location = match outcome {
        Mutation::Applied(value) => on_applied(value),
        Mutation::Denied => urls::post_detail(post_id),
    };
    Redirect::to(&location).into_response()
}

/// Form prefill: the entity as JSON for its author, a redirect for anyone else.
pub(crate) fn prefill_or_redirect<T, D>(outcome: Mutation<T>, post_id: i64) -> Response
where
    D: From<T> + serde::Serialize,
{
    match outcome {
        Mutation::Applied(value) => axum::Json(D::from(value)).into_response(),
        Mutation::Denied => Redirect::to(&urls::post_detail(post_id)).into_response(),
    }
}
