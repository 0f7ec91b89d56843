use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::data::category_repository::CategoryRepository;
use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_query::{PostQuery, PostScope};
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::category::Category;
use crate::domain::comment::{Comment, CommentForm};
use crate::domain::error::DomainError;
use crate::domain::policy::{Viewer, can_mutate, can_view_post};
use crate::domain::post::{AnnotatedPost, Post, PostForm};
use crate::domain::user::User;

/// Outcome of an author-only operation. A non-author gets `Denied`, which is
/// not an error: the caller decides where to send them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mutation<T> {
    Applied(T),
    Denied,
}

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<AnnotatedPost>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct CategoryFeed {
    pub(crate) category: Category,
    pub(crate) listing: ListPostsResult,
}

#[derive(Debug, Clone)]
pub(crate) struct ProfileFeed {
    pub(crate) profile: User,
    pub(crate) listing: ListPostsResult,
}

#[derive(Debug, Clone)]
pub(crate) struct PostDetail {
    pub(crate) post: Post,
    pub(crate) comments: Vec<Comment>,
}

pub(crate) struct BlogService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    categories: Arc<dyn CategoryRepository>,
    users: Arc<dyn UserRepository>,
    page_size: u32,
}

impl BlogService {
    pub(crate) fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        categories: Arc<dyn CategoryRepository>,
        users: Arc<dyn UserRepository>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            comments,
            categories,
            users,
            page_size: page_size.max(1),
        }
    }

    /// Filtered, annotated, ordered page of posts.
    ///
    /// Pages past the end are `NotFound`, except the first page of an empty
    /// listing.
    pub(crate) async fn list_posts(
        &self,
        query: PostQuery,
        page: u32,
    ) -> Result<ListPostsResult, DomainError> {
        let now = Utc::now();
        let pagination = Pagination {
            page: page.max(1),
            page_size: self.page_size,
        };

        let total = self.posts.count_posts(&query, now).await?;
        if pagination.page > 1 && pagination.offset() >= total {
            return Err(DomainError::NotFound(format!("page {}", pagination.page)));
        }
        let posts = self.posts.list_posts(&query, now, pagination).await?;

        Ok(ListPostsResult {
            posts,
            page: pagination.page,
            page_size: pagination.page_size,
            total,
        })
    }

    pub(crate) async fn list_feed(&self, page: u32) -> Result<ListPostsResult, DomainError> {
        self.list_posts(PostQuery::public(PostScope::All), page).await
    }

    /// Unpublished categories are reported exactly like missing ones.
    pub(crate) async fn category_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or_else(|| DomainError::NotFound(format!("category slug: {slug}")))
    }

    pub(crate) async fn list_category(
        &self,
        slug: &str,
        page: u32,
    ) -> Result<CategoryFeed, DomainError> {
        let category = self.category_by_slug(slug).await?;
        let listing = self
            .list_posts(PostQuery::public(PostScope::ByCategory(category.id)), page)
            .await?;
        Ok(CategoryFeed { category, listing })
    }

    pub(crate) async fn list_profile(
        &self,
        username: &str,
        viewer: Viewer,
        page: u32,
    ) -> Result<ProfileFeed, DomainError> {
        let profile = self
            .users
            .find_by_username(username)
            .await?
            .map(|creds| creds.user)
            .ok_or_else(|| DomainError::NotFound(format!("user: {username}")))?;

        let query = if viewer.is(profile.id) {
            PostQuery::owner(profile.id)
        } else {
            PostQuery::public(PostScope::ByAuthor(profile.id))
        };
        let listing = self.list_posts(query, page).await?;
        Ok(ProfileFeed { profile, listing })
    }

    /// The post if `viewer` may see it; `NotFound` otherwise.
    pub(crate) async fn get_visible_post(
        &self,
        post_id: i64,
        viewer: Viewer,
    ) -> Result<Post, DomainError> {
        let post = self.find_post(post_id).await?;
        if !can_view_post(&post, viewer) {
            debug!(post_id, ?viewer, "post hidden from viewer");
            return Err(DomainError::post_not_found(post_id));
        }
        Ok(post)
    }

    pub(crate) async fn get_post_detail(
        &self,
        post_id: i64,
        viewer: Viewer,
    ) -> Result<PostDetail, DomainError> {
        let post = self.get_visible_post(post_id, viewer).await?;
        let comments = self.comments.list_for_post(post_id).await?;
        Ok(PostDetail { post, comments })
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        form: PostForm,
    ) -> Result<Post, DomainError> {
        let form = form.validate()?;

        let new_post = NewPost {
            title: form.title,
            text: form.text,
            pub_date: form.pub_date.unwrap_or_else(Utc::now),
            is_published: form.is_published.unwrap_or(true),
            author_id,
            category_id: form.category_id,
            location_id: form.location_id,
            image: form.image,
        };
        let post = self.posts.create_post(new_post).await?;
        info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    pub(crate) async fn get_post_for_edit(
        &self,
        actor_user_id: i64,
        post_id: i64,
    ) -> Result<Mutation<Post>, DomainError> {
        let post = self.find_post(post_id).await?;
        if !can_mutate(&post, actor_user_id) {
            debug!(post_id, actor_user_id, "post edit denied");
            return Ok(Mutation::Denied);
        }
        Ok(Mutation::Applied(post))
    }

    pub(crate) async fn update_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        form: PostForm,
    ) -> Result<Mutation<Post>, DomainError> {
        let original = self.find_post(post_id).await?;
        if !can_mutate(&original, actor_user_id) {
            debug!(post_id, actor_user_id, "post update denied");
            return Ok(Mutation::Denied);
        }

        let form = form.validate()?;
        let patch = PostPatch {
            title: form.title,
            text: form.text,
            pub_date: form.pub_date.unwrap_or(original.pub_date),
            is_published: form.is_published.unwrap_or(original.is_published),
            category_id: form.category_id,
            location_id: form.location_id,
            image: form.image,
        };
        let post = self
            .posts
            .update_post_owned(post_id, actor_user_id, patch)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))?;
        info!(post_id, actor_user_id, "post updated");
        Ok(Mutation::Applied(post))
    }

    pub(crate) async fn delete_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
    ) -> Result<Mutation<Post>, DomainError> {
        let original = self.find_post(post_id).await?;
        if !can_mutate(&original, actor_user_id) {
            debug!(post_id, actor_user_id, "post delete denied");
            return Ok(Mutation::Denied);
        }

        let deleted = self.posts.delete_post_owned(post_id, actor_user_id).await?;
        if !deleted {
            return Err(DomainError::post_not_found(post_id));
        }
        info!(post_id, actor_user_id, "post deleted");
        Ok(Mutation::Applied(original))
    }

    /// Commenting requires the commenter to be able to see the post.
    pub(crate) async fn add_comment(
        &self,
        author_id: i64,
        post_id: i64,
        form: CommentForm,
    ) -> Result<Comment, DomainError> {
        self.get_visible_post(post_id, Viewer::User(author_id)).await?;
        let form = form.validate()?;

        let comment = self
            .comments
            .create_comment(NewComment {
                text: form.text,
                post_id,
                author_id,
            })
            .await?;
        info!(comment_id = comment.id, post_id, author_id, "comment added");
        Ok(comment)
    }

    pub(crate) async fn get_comment_for_edit(
        &self,
        actor_user_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Mutation<Comment>, DomainError> {
        let comment = self.find_comment(post_id, comment_id).await?;
        if !can_mutate(&comment, actor_user_id) {
            debug!(comment_id, actor_user_id, "comment edit denied");
            return Ok(Mutation::Denied);
        }
        Ok(Mutation::Applied(comment))
    }

    pub(crate) async fn update_comment(
        &self,
        actor_user_id: i64,
        post_id: i64,
        comment_id: i64,
        form: CommentForm,
    ) -> Result<Mutation<Comment>, DomainError> {
        let original = self.find_comment(post_id, comment_id).await?;
        if !can_mutate(&original, actor_user_id) {
            debug!(comment_id, actor_user_id, "comment update denied");
            return Ok(Mutation::Denied);
        }

        let form = form.validate()?;
        let comment = self
            .comments
            .update_comment_owned(comment_id, actor_user_id, form.text)
            .await?
            .ok_or_else(|| DomainError::comment_not_found(comment_id))?;
        info!(comment_id, actor_user_id, "comment updated");
        Ok(Mutation::Applied(comment))
    }

    pub(crate) async fn delete_comment(
        &self,
        actor_user_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Mutation<()>, DomainError> {
        let original = self.find_comment(post_id, comment_id).await?;
        if !can_mutate(&original, actor_user_id) {
            debug!(comment_id, actor_user_id, "comment delete denied");
            return Ok(Mutation::Denied);
        }

        let deleted = self
            .comments
            .delete_comment_owned(comment_id, actor_user_id)
            .await?;
        if !deleted {
            return Err(DomainError::comment_not_found(comment_id));
        }
        info!(comment_id, actor_user_id, "comment deleted");
        Ok(Mutation::Applied(()))
    }

    async fn find_post(&self, post_id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    // A comment addressed through the wrong post does not exist there.
    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Comment, DomainError> {
        self.comments
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::comment_not_found(comment_id))
    }
}
