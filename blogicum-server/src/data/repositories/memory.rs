//! In-memory entity store backing service and router tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::data::category_repository::CategoryRepository;
use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_query::PostQuery;
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::data::user_repository::{NewUser, ProfilePatch, UserCredentials, UserRepository};
use crate::domain::category::Category;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::post::{AnnotatedPost, Post};
use crate::domain::user::User;

#[derive(Debug, Clone)]
struct StoredPost {
    id: i64,
    title: String,
    text: String,
    pub_date: DateTime<Utc>,
    is_published: bool,
    author_id: i64,
    category_id: Option<i64>,
    location_id: Option<i64>,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredComment {
    id: i64,
    text: String,
    post_id: i64,
    author_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, UserCredentials>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, StoredPost>,
    comments: BTreeMap<i64, StoredComment>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn materialize(&self, stored: &StoredPost) -> Result<Post, DomainError> {
        let author = self
            .users
            .get(&stored.author_id)
            .ok_or_else(|| DomainError::NotFound("author".to_string()))?
            .user
            .as_author();
        Ok(Post {
            id: stored.id,
            title: stored.title.clone(),
            text: stored.text.clone(),
            pub_date: stored.pub_date,
            is_published: stored.is_published,
            author,
            category: stored
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            location: stored
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
            image: stored.image.clone(),
            created_at: stored.created_at,
        })
    }

    fn materialize_comment(&self, stored: &StoredComment) -> Result<Comment, DomainError> {
        let author = self
            .users
            .get(&stored.author_id)
            .ok_or_else(|| DomainError::NotFound("author".to_string()))?
            .user
            .as_author();
        Ok(Comment {
            id: stored.id,
            text: stored.text.clone(),
            post_id: stored.post_id,
            author,
            created_at: stored.created_at,
        })
    }

    fn comment_count(&self, post_id: i64) -> i64 {
        self.comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .count() as i64
    }

    fn check_references(
        &self,
        category_id: Option<i64>,
        location_id: Option<i64>,
    ) -> Result<(), DomainError> {
        if category_id.is_some_and(|id| !self.categories.contains_key(&id)) {
            return Err(DomainError::NotFound("category".to_string()));
        }
        if location_id.is_some_and(|id| !self.locations.contains_key(&id)) {
            return Err(DomainError::NotFound("location".to_string()));
        }
        Ok(())
    }

    fn matching_posts(
        &self,
        query: &PostQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<AnnotatedPost>, DomainError> {
        let mut posts = Vec::new();
        for stored in self.posts.values() {
            let post = self.materialize(stored)?;
            if query.admits(&post, now) {
                posts.push(AnnotatedPost {
                    comment_count: self.comment_count(post.id),
                    post,
                });
            }
        }
        posts.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then(a.post.id.cmp(&b.post.id))
        });
        Ok(posts)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn add_category(&self, slug: &str, is_published: bool) -> Category {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let category = Category {
            id,
            title: slug.to_uppercase(),
            description: format!("posts about {slug}"),
            slug: slug.to_string(),
            is_published,
            created_at: Utc::now(),
        };
        state.categories.insert(id, category.clone());
        category
    }

    pub(crate) async fn set_category_published(&self, category_id: i64, is_published: bool) {
        let mut state = self.state.write().await;
        if let Some(category) = state.categories.get_mut(&category_id) {
            category.is_published = is_published;
        }
    }

    pub(crate) async fn add_location(&self, name: &str) -> Location {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let location = Location {
            id,
            name: name.to_string(),
            is_published: true,
            created_at: Utc::now(),
        };
        state.locations.insert(id, location.clone());
        location
    }

    pub(crate) async fn comment_exists(&self, comment_id: i64) -> bool {
        self.state.read().await.comments.contains_key(&comment_id)
    }

    pub(crate) async fn post_exists(&self, post_id: i64) -> bool {
        self.state.read().await.posts.contains_key(&post_id)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&input.author_id) {
            return Err(DomainError::NotFound("author".to_string()));
        }
        state.check_references(input.category_id, input.location_id)?;

        let id = state.next_id();
        let stored = StoredPost {
            id,
            title: input.title,
            text: input.text,
            pub_date: input.pub_date,
            is_published: input.is_published,
            author_id: input.author_id,
            category_id: input.category_id,
            location_id: input.location_id,
            image: input.image,
            created_at: Utc::now(),
        };
        let post = state.materialize(&stored)?;
        state.posts.insert(id, stored);
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let state = self.state.read().await;
        state
            .posts
            .get(&id)
            .map(|stored| state.materialize(stored))
            .transpose()
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let mut state = self.state.write().await;
        state.check_references(patch.category_id, patch.location_id)?;

        let Some(stored) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        if stored.author_id != owner_id {
            return Ok(None);
        }
        stored.title = patch.title;
        stored.text = patch.text;
        stored.pub_date = patch.pub_date;
        stored.is_published = patch.is_published;
        stored.category_id = patch.category_id;
        stored.location_id = patch.location_id;
        stored.image = patch.image;

        let stored = stored.clone();
        state.materialize(&stored).map(Some)
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let owned = state
            .posts
            .get(&post_id)
            .is_some_and(|stored| stored.author_id == owner_id);
        if !owned {
            return Ok(false);
        }
        state.posts.remove(&post_id);
        state.comments.retain(|_, comment| comment.post_id != post_id);
        Ok(true)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        now: DateTime<Utc>,
        pagination: Pagination,
    ) -> Result<Vec<AnnotatedPost>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .matching_posts(query, now)?
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn count_posts(&self, query: &PostQuery, now: DateTime<Utc>) -> Result<i64, DomainError> {
        let state = self.state.read().await;
        Ok(state.matching_posts(query, now)?.len() as i64)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&input.post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        let id = state.next_id();
        let stored = StoredComment {
            id,
            text: input.text,
            post_id: input.post_id,
            author_id: input.author_id,
            created_at: Utc::now(),
        };
        let comment = state.materialize_comment(&stored)?;
        state.comments.insert(id, stored);
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        let state = self.state.read().await;
        state
            .comments
            .get(&id)
            .map(|stored| state.materialize_comment(stored))
            .transpose()
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let state = self.state.read().await;
        let mut comments = state
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .map(|stored| state.materialize_comment(stored))
            .collect::<Result<Vec<_>, _>>()?;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn update_comment_owned(
        &self,
        comment_id: i64,
        owner_id: i64,
        text: String,
    ) -> Result<Option<Comment>, DomainError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.comments.get_mut(&comment_id) else {
            return Ok(None);
        };
        if stored.author_id != owner_id {
            return Ok(None);
        }
        stored.text = text;
        let stored = stored.clone();
        state.materialize_comment(&stored).map(Some)
    }

    async fn delete_comment_owned(
        &self,
        comment_id: i64,
        owner_id: i64,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let owned = state
            .comments
            .get(&comment_id)
            .is_some_and(|stored| stored.author_id == owner_id);
        if owned {
            state.comments.remove(&comment_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .find(|category| category.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        for creds in state.users.values() {
            if creds.user.username == input.username {
                return Err(DomainError::AlreadyExists("username".to_string()));
            }
            if creds.user.email == input.email {
                return Err(DomainError::AlreadyExists("email".to_string()));
            }
        }
        let id = state.next_id();
        let user = User::new(id, input.username, input.email, Utc::now())?;
        state.users.insert(
            id,
            UserCredentials {
                user: user.clone(),
                password_hash: input.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|creds| creds.user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: i64,
        patch: ProfilePatch,
    ) -> Result<Option<User>, DomainError> {
        let mut state = self.state.write().await;
        for (other_id, creds) in &state.users {
            if *other_id == id {
                continue;
            }
            if creds.user.username == patch.username {
                return Err(DomainError::AlreadyExists("username".to_string()));
            }
            if creds.user.email == patch.email {
                return Err(DomainError::AlreadyExists("email".to_string()));
            }
        }
        let Some(creds) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        creds.user.username = patch.username;
        creds.user.email = patch.email;
        creds.user.first_name = patch.first_name;
        creds.user.last_name = patch.last_name;
        Ok(Some(creds.user.clone()))
    }

    async fn update_password_hash(
        &self,
        id: i64,
        password_hash: String,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(creds) => {
                creds.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
