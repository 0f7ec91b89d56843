use chrono::{DateTime, Utc};

use crate::domain::post::Post;

/// Which posts a listing draws from, before visibility filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostScope {
    All,
    ByCategory(i64),
    ByAuthor(i64),
}

/// Everything that shapes a post listing. Built explicitly at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PostQuery {
    pub(crate) scope: PostScope,
    /// Keep unpublished posts and posts whose category is missing or unpublished.
    pub(crate) include_hidden: bool,
    /// Keep posts with `pub_date` after the reference instant.
    pub(crate) include_future: bool,
}

impl PostQuery {
    pub(crate) fn public(scope: PostScope) -> Self {
        Self {
            scope,
            include_hidden: false,
            include_future: false,
        }
    }

    /// An author browsing their own profile sees every post they wrote.
    pub(crate) fn owner(author_id: i64) -> Self {
        Self {
            scope: PostScope::ByAuthor(author_id),
            include_hidden: true,
            include_future: true,
        }
    }

    /// In-process form of the SQL filter emitted by the postgres repository.
    pub(crate) fn admits(&self, post: &Post, now: DateTime<Utc>) -> bool {
        let in_scope = match self.scope {
            PostScope::All => true,
            PostScope::ByCategory(category_id) => {
                post.category.as_ref().map(|category| category.id) == Some(category_id)
            }
            PostScope::ByAuthor(author_id) => post.author.id == author_id,
        };
        if !in_scope {
            return false;
        }

        if !self.include_hidden {
            let category_published = post
                .category
                .as_ref()
                .is_some_and(|category| category.is_published);
            if !post.is_published || !category_published {
                return false;
            }
        }

        self.include_future || post.pub_date <= now
    }
}
