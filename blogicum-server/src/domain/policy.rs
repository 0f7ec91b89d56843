//! Who may see a post, and who may change posts and comments.
//!
//! Everything here is pure. A negative visibility answer is turned into
//! [`DomainError::NotFound`](super::error::DomainError::NotFound) by callers,
//! so a hidden post is indistinguishable from a missing one. A negative
//! mutation answer is turned into a redirect by the HTTP layer.

use chrono::{DateTime, Utc};

use super::comment::Comment;
use super::post::Post;

/// Identity of whoever is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Viewer {
    Anonymous,
    User(i64),
}

impl Viewer {
    pub(crate) fn user_id(self) -> Option<i64> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(id),
        }
    }

    pub(crate) fn is(self, user_id: i64) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl From<Option<i64>> for Viewer {
    fn from(user_id: Option<i64>) -> Self {
        user_id.map_or(Viewer::Anonymous, Viewer::User)
    }
}

/// Entities that carry an owning author.
pub(crate) trait Authored {
    fn author_id(&self) -> i64;
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author.id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author.id
    }
}

/// Published, in a published category, and not scheduled for later.
///
/// A post without a category has no published category and stays hidden.
pub(crate) fn is_publicly_visible(post: &Post, now: DateTime<Utc>) -> bool {
    post.is_published
        && post
            .category
            .as_ref()
            .is_some_and(|category| category.is_published)
        && post.pub_date <= now
}

pub(crate) fn can_view_post(post: &Post, viewer: Viewer) -> bool {
    can_view_post_at(post, viewer, Utc::now())
}

pub(crate) fn can_view_post_at(post: &Post, viewer: Viewer, now: DateTime<Utc>) -> bool {
    viewer.is(post.author_id()) || is_publicly_visible(post, now)
}

pub(crate) fn can_mutate<E: Authored + ?Sized>(entity: &E, actor_id: i64) -> bool {
    entity.author_id() == actor_id
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::{Viewer, can_mutate, can_view_post, can_view_post_at, is_publicly_visible};
    use crate::domain::category::Category;
    use crate::domain::comment::Comment;
    use crate::domain::post::Post;
    use crate::domain::user::Author;

    const AUTHOR: i64 = 1;
    const STRANGER: i64 = 2;

    fn category(is_published: bool) -> Category {
        Category {
            id: 1,
            title: "Travel".to_string(),
            description: "Trips".to_string(),
            slug: "travel".to_string(),
            is_published,
            created_at: Utc::now(),
        }
    }

    fn post(is_published: bool, category: Option<Category>, pub_date: DateTime<Utc>) -> Post {
        Post {
            id: 10,
            title: "Title".to_string(),
            text: "Text".to_string(),
            pub_date,
            is_published,
            author: Author {
                id: AUTHOR,
                username: "author".to_string(),
            },
            category,
            location: None,
            image: None,
            created_at: Utc::now(),
        }
    }

    fn hidden_variants(now: DateTime<Utc>) -> Vec<Post> {
        vec![
            post(false, Some(category(true)), now - Duration::days(1)),
            post(true, Some(category(false)), now - Duration::days(1)),
            post(true, None, now - Duration::days(1)),
            post(true, Some(category(true)), now + Duration::seconds(1)),
        ]
    }

    #[test]
    fn hidden_posts_are_visible_only_to_their_author() {
        let now = Utc::now();
        for post in hidden_variants(now) {
            assert!(can_view_post_at(&post, Viewer::User(AUTHOR), now));
            assert!(!can_view_post_at(&post, Viewer::User(STRANGER), now));
            assert!(!can_view_post_at(&post, Viewer::Anonymous, now));
        }
    }

    #[test]
    fn public_posts_are_visible_to_everyone() {
        let now = Utc::now();
        let post = post(true, Some(category(true)), now - Duration::minutes(5));
        for viewer in [Viewer::Anonymous, Viewer::User(AUTHOR), Viewer::User(STRANGER)] {
            assert!(can_view_post_at(&post, viewer, now));
        }
    }

    #[test]
    fn post_dated_exactly_now_is_published() {
        let now = Utc::now();
        let post = post(true, Some(category(true)), now);
        assert!(is_publicly_visible(&post, now));
        assert!(can_view_post_at(&post, Viewer::Anonymous, now));
    }

    #[test]
    fn publishing_and_backdating_reveals_post() {
        let mut post = post(false, Some(category(true)), Utc::now() + Duration::days(7));
        assert!(can_view_post(&post, Viewer::User(AUTHOR)));
        assert!(!can_view_post(&post, Viewer::Anonymous));

        post.is_published = true;
        post.pub_date = Utc::now() - Duration::days(1);
        assert!(can_view_post(&post, Viewer::Anonymous));
    }

    #[test]
    fn only_author_can_mutate_posts_and_comments() {
        let post = post(true, Some(category(true)), Utc::now());
        let comment = Comment {
            id: 5,
            text: "hi".to_string(),
            post_id: post.id,
            author: Author {
                id: STRANGER,
                username: "stranger".to_string(),
            },
            created_at: Utc::now(),
        };

        assert!(can_mutate(&post, AUTHOR));
        assert!(!can_mutate(&post, STRANGER));
        assert!(can_mutate(&comment, STRANGER));
        assert!(!can_mutate(&comment, AUTHOR));
    }

    #[test]
    fn viewer_from_optional_user_id() {
        assert_eq!(Viewer::from(None), Viewer::Anonymous);
        assert_eq!(Viewer::from(Some(4)), Viewer::User(4));
        assert!(Viewer::User(4).is(4));
        assert!(!Viewer::Anonymous.is(4));
    }
}
