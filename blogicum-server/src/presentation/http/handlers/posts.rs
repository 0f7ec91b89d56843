use axum::{
    Json,
    extract::{Path, Query, State},
    response::{Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::blog_service::{CategoryFeed, ListPostsResult, PostDetail};
use crate::domain::category::Category;
use crate::domain::location::Location;
use crate::domain::post::{AnnotatedPost, Post, PostForm};
use crate::domain::user::Author;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::handlers::comments::CommentDto;
use crate::presentation::http::handlers::{prefill_or_redirect, redirect_after};
use crate::presentation::http::middleware::auth::{AuthenticatedUser, CurrentViewer};
use crate::presentation::http::urls;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PostFormDto {
    #[validate(length(min = 1, max = 256))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) text: String,
    /// Defaults to now on create; kept as stored on edit.
    pub(crate) pub_date: Option<DateTime<Utc>>,
    pub(crate) is_published: Option<bool>,
    #[validate(range(min = 1))]
    pub(crate) category_id: Option<i64>,
    #[validate(range(min = 1))]
    pub(crate) location_id: Option<i64>,
    #[validate(length(max = 512))]
    pub(crate) image: Option<String>,
}

impl From<PostFormDto> for PostForm {
    fn from(dto: PostFormDto) -> Self {
        Self {
            title: dto.title,
            text: dto.text,
            pub_date: dto.pub_date,
            is_published: dto.is_published,
            category_id: dto.category_id,
            location_id: dto.location_id,
            image: dto.image,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PageQuery {
    pub(crate) page: Option<u32>,
}

impl PageQuery {
    pub(crate) fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthorDto {
    pub(crate) id: i64,
    pub(crate) username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LocationDto {
    pub(crate) id: i64,
    pub(crate) name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) is_published: bool,
    pub(crate) author: AuthorDto,
    pub(crate) category: Option<CategoryDto>,
    pub(crate) location: Option<LocationDto>,
    pub(crate) image: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) comment_count: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryFeedDto {
    pub(crate) category: CategoryDto,
    pub(crate) listing: ListPostsResponseDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDetailDto {
    pub(crate) post: PostDto,
    pub(crate) comments: Vec<CommentDto>,
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            username: author.username,
        }
    }
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            title: category.title,
            description: category.description,
            slug: category.slug,
        }
    }
}

impl From<Location> for LocationDto {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            text: post.text,
            pub_date: post.pub_date,
            is_published: post.is_published,
            author: post.author.into(),
            category: post.category.map(CategoryDto::from),
            location: post.location.map(LocationDto::from),
            image: post.image,
            created_at: post.created_at,
            comment_count: None,
        }
    }
}

impl From<AnnotatedPost> for PostDto {
    fn from(annotated: AnnotatedPost) -> Self {
        Self {
            comment_count: Some(annotated.comment_count),
            ..Self::from(annotated.post)
        }
    }
}

impl From<ListPostsResult> for ListPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostDto::from).collect(),
            page: result.page,
            page_size: result.page_size,
            total: result.total,
        }
    }
}

impl From<CategoryFeed> for CategoryFeedDto {
    fn from(feed: CategoryFeed) -> Self {
        Self {
            category: feed.category.into(),
            listing: feed.listing.into(),
        }
    }
}

impl From<PostDetail> for PostDetailDto {
    fn from(detail: PostDetail) -> Self {
        let comment_count = i64::try_from(detail.comments.len()).unwrap_or(i64::MAX);
        Self {
            post: PostDto {
                comment_count: Some(comment_count),
                ..PostDto::from(detail.post)
            },
            comments: detail.comments.into_iter().map(CommentDto::from).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Publicly visible posts", body = ListPostsResponseDto),
        (status = 404, description = "Page out of range"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ListPostsResponseDto>> {
    let result = state.blog_service.list_feed(query.page()).await?;

    Ok(Json(result.into()))
}

#[utoipa::path(
    get,
    path = "/category/{slug}/",
    tag = "posts",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ("page" = Option<u32>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Category with its visible posts", body = CategoryFeedDto),
        (status = 404, description = "Category missing or unpublished"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<CategoryFeedDto>> {
    let feed = state
        .blog_service
        .list_category(&slug, query.page())
        .await?;

    Ok(Json(feed.into()))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post with its comments", body = PostDetailDto),
        (status = 404, description = "Post missing or hidden from the viewer"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn post_detail(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(post_id): Path<i64>,
) -> AppResult<Json<PostDetailDto>> {
    let detail = state.blog_service.get_post_detail(post_id, viewer).await?;

    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/posts/create/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = PostFormDto,
    responses(
        (status = 303, description = "Created; redirects to the author's profile"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown category or location"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<PostFormDto>,
) -> AppResult<Redirect> {
    dto.validate()?;

    let post = state
        .blog_service
        .create_post(auth.user_id, dto.into())
        .await?;
    Ok(Redirect::to(&urls::profile(&post.author.username)))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Current post fields", body = PostDto),
        (status = 303, description = "Not the author; redirects to the post detail"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn edit_post_form(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let outcome = state
        .blog_service
        .get_post_for_edit(auth.user_id, post_id)
        .await?;

    Ok(prefill_or_redirect::<_, PostDto>(outcome, post_id))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id")
    ),
    request_body = PostFormDto,
    responses(
        (status = 303, description = "Updated, or not the author; redirects to the post detail"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post, category or location not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn edit_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
    Json(dto): Json<PostFormDto>,
) -> AppResult<Response> {
    // Field checks run inside the service, after ownership is settled.
    let outcome = state
        .blog_service
        .update_post(auth.user_id, post_id, dto.into())
        .await?;
    Ok(redirect_after(outcome, post_id, |post| urls::post_detail(post.id)))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("post_id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 303, description = "Deleted (redirects to the author's profile) or not the author (redirects to the post detail)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let outcome = state.blog_service.delete_post(auth.user_id, post_id).await?;

    Ok(redirect_after(outcome, post_id, |post| urls::profile(&post.author.username)))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{PostDetailDto, PostDto};
    use crate::application::blog_service::PostDetail;
    use crate::domain::comment::Comment;
    use crate::domain::post::{AnnotatedPost, Post};
    use crate::domain::user::Author;

    fn post() -> Post {
        Post {
            id: 7,
            title: "Harbor at dawn".to_string(),
            text: "Fog over the water.".to_string(),
            pub_date: Utc::now(),
            is_published: true,
            author: Author {
                id: 1,
                username: "ada".to_string(),
            },
            category: None,
            location: None,
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn annotated_post_carries_comment_count() {
        let dto = PostDto::from(AnnotatedPost {
            post: post(),
            comment_count: 3,
        });
        assert_eq!(dto.comment_count, Some(3));
        assert_eq!(dto.author.username, "ada");

        let json = serde_json::to_value(PostDto::from(post())).expect("must serialize");
        assert!(json.get("comment_count").is_none());
    }

    #[test]
    fn detail_counts_its_comments() {
        let comment = Comment {
            id: 1,
            text: "Lovely".to_string(),
            post_id: 7,
            author: Author {
                id: 2,
                username: "bob".to_string(),
            },
            created_at: Utc::now(),
        };
        let dto = PostDetailDto::from(PostDetail {
            post: post(),
            comments: vec![comment.clone(), comment],
        });
        assert_eq!(dto.post.comment_count, Some(2));
        assert_eq!(dto.comments.len(), 2);
    }
}
