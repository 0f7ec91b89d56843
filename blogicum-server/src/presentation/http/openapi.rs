use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::http::handlers::auth::{AuthResponseDto, LoginDto, RegisterDto, UserDto};
use crate::presentation::http::handlers::comments::{CommentDto, CommentFormDto};
use crate::presentation::http::handlers::health::HealthDto;
use crate::presentation::http::handlers::posts::{
    AuthorDto, CategoryDto, CategoryFeedDto, ListPostsResponseDto, LocationDto, PostDetailDto,
    PostDto, PostFormDto,
};
use crate::presentation::http::handlers::profile::{
    PasswordChangeDto, ProfileDto, ProfileEditDto, PublicUserDto,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Blogicum", description = "Blog posts, comments and profiles"),
    paths(
        crate::presentation::http::handlers::health::healthz,
        crate::presentation::http::handlers::auth::register,
        crate::presentation::http::handlers::auth::login,
        crate::presentation::http::handlers::posts::index,
        crate::presentation::http::handlers::posts::category_posts,
        crate::presentation::http::handlers::posts::post_detail,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::edit_post_form,
        crate::presentation::http::handlers::posts::edit_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::comments::add_comment,
        crate::presentation::http::handlers::comments::edit_comment_form,
        crate::presentation::http::handlers::comments::edit_comment,
        crate::presentation::http::handlers::comments::delete_comment,
        crate::presentation::http::handlers::profile::profile,
        crate::presentation::http::handlers::profile::edit_profile_form,
        crate::presentation::http::handlers::profile::edit_profile,
        crate::presentation::http::handlers::profile::change_password
    ),
    components(
        schemas(
            HealthDto,
            RegisterDto,
            LoginDto,
            AuthResponseDto,
            UserDto,
            PostFormDto,
            AuthorDto,
            CategoryDto,
            LocationDto,
            PostDto,
            ListPostsResponseDto,
            CategoryFeedDto,
            PostDetailDto,
            CommentFormDto,
            CommentDto,
            PublicUserDto,
            ProfileDto,
            ProfileEditDto,
            PasswordChangeDto
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration and login"),
        (name = "posts", description = "Feeds, post detail and post authoring"),
        (name = "comments", description = "Comment authoring"),
        (name = "profile", description = "Profiles and account settings")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
