use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::presentation::AppState;
use crate::presentation::http::handlers::{auth, comments, health, posts, profile};
use crate::presentation::http::middleware::auth::{
    identify_viewer_middleware, jwt_auth_middleware,
};

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .merge(public_router(state.clone()))
        .merge(protected_router(state.clone()))
        .nest("/auth", auth_router())
        .with_state(state)
}

/// Readable by anyone; a valid token widens what the viewer sees.
fn public_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(posts::index))
        .route("/category/{slug}/", get(posts::category_posts))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route("/profile/{username}/", get(profile::profile))
        .route_layer(middleware::from_fn_with_state(
            state,
            identify_viewer_middleware,
        ))
}

fn protected_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/posts/create/", post(posts::create_post))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_post_form).post(posts::edit_post),
        )
        .route("/posts/{post_id}/delete/", post(posts::delete_post))
        .route("/posts/{post_id}/comment/", post(comments::add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(comments::edit_comment_form).post(comments::edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            post(comments::delete_comment),
        )
        .route(
            "/profile_edit/",
            get(profile::edit_profile_form).post(profile::edit_profile),
        )
        .route("/profile_edit/password/", post(profile::change_password))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/registration/", post(auth::register))
        .route("/login/", post(auth::login))
}
