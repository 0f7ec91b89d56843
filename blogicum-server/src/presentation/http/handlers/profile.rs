use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::blog_service::ProfileFeed;
use crate::domain::user::{ChangePasswordRequest, UpdateProfileRequest, User};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::handlers::auth::UserDto;
use crate::presentation::http::handlers::posts::{ListPostsResponseDto, PageQuery};
use crate::presentation::http::middleware::auth::{AuthenticatedUser, CurrentViewer};
use crate::presentation::http::urls;

/// A user as seen by anyone. No email.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PublicUserDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ProfileDto {
    pub(crate) profile: PublicUserDto,
    pub(crate) listing: ListPostsResponseDto,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ProfileEditDto {
    #[validate(length(min = 3, max = 64))]
    pub(crate) username: String,
    #[validate(email)]
    pub(crate) email: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub(crate) first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub(crate) last_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PasswordChangeDto {
    #[validate(length(min = 1))]
    pub(crate) old_password: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) new_password: String,
}

impl From<User> for PublicUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

impl From<ProfileFeed> for ProfileDto {
    fn from(feed: ProfileFeed) -> Self {
        Self {
            profile: feed.profile.into(),
            listing: feed.listing.into(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/profile/{username}/",
    tag = "profile",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<u32>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Profile with posts; the owner also sees hidden ones", body = ProfileDto),
        (status = 404, description = "User not found or page out of range"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn profile(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfileDto>> {
    let feed = state
        .blog_service
        .list_profile(&username, viewer, query.page())
        .await?;

    Ok(Json(feed.into()))
}

#[utoipa::path(
    get,
    path = "/profile_edit/",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own profile", body = UserDto),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn edit_profile_form(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<UserDto>> {
    let user = state.profile_service.get_profile(auth.user_id).await?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/profile_edit/",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ProfileEditDto,
    responses(
        (status = 303, description = "Updated; redirects to the profile"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Username or email already taken"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn edit_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<ProfileEditDto>,
) -> AppResult<Redirect> {
    dto.validate()?;

    let req = UpdateProfileRequest {
        username: dto.username,
        email: dto.email,
        first_name: dto.first_name,
        last_name: dto.last_name,
    };
    let user = state
        .profile_service
        .update_profile(auth.user_id, req)
        .await?;
    Ok(Redirect::to(&urls::profile(&user.username)))
}

#[utoipa::path(
    post,
    path = "/profile_edit/password/",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    request_body = PasswordChangeDto,
    responses(
        (status = 303, description = "Password changed; redirects to the feed"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong old password"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn change_password(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<PasswordChangeDto>,
) -> AppResult<Redirect> {
    dto.validate()?;

    let req = ChangePasswordRequest {
        old_password: dto.old_password,
        new_password: dto.new_password,
    };
    state
        .auth_service
        .change_password(auth.user_id, req)
        .await?;
    Ok(Redirect::to(&urls::index()))
}
