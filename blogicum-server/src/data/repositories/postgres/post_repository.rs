use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::map_foreign_key_violation;
use crate::data::post_query::{PostQuery, PostScope};
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::post::{AnnotatedPost, Post};
use crate::domain::user::Author;

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Author, category and location ride along in the same statement as the
// post, and the comment count is aggregated from live rows.
const POST_COLUMNS: &str = r#"
SELECT
    p.id,
    p.title,
    p.text,
    p.pub_date,
    p.is_published,
    p.image,
    p.created_at,
    u.id AS author_id,
    u.username AS author_username,
    c.id AS category_id,
    c.title AS category_title,
    c.description AS category_description,
    c.slug AS category_slug,
    c.is_published AS category_is_published,
    c.created_at AS category_created_at,
    l.id AS location_id,
    l.name AS location_name,
    l.is_published AS location_is_published,
    l.created_at AS location_created_at,
    (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
"#;

const POST_JOINS: &str = r#"
JOIN users u ON u.id = p.author_id
LEFT JOIN categories c ON c.id = p.category_id
LEFT JOIN locations l ON l.id = p.location_id
"#;

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    pub_date: DateTime<Utc>,
    is_published: bool,
    image: Option<String>,
    created_at: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    category_id: Option<i64>,
    category_title: Option<String>,
    category_description: Option<String>,
    category_slug: Option<String>,
    category_is_published: Option<bool>,
    category_created_at: Option<DateTime<Utc>>,
    location_id: Option<i64>,
    location_name: Option<String>,
    location_is_published: Option<bool>,
    location_created_at: Option<DateTime<Utc>>,
    comment_count: i64,
}

fn select_posts<'args>() -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(POST_COLUMNS);
    builder.push(" FROM posts p").push(POST_JOINS);
    builder
}

/// Appends the WHERE clause equivalent to [`PostQuery::admits`].
fn push_post_filters<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    query: &PostQuery,
    now: DateTime<Utc>,
) {
    builder.push(" WHERE TRUE");
    match query.scope {
        PostScope::All => {}
        PostScope::ByCategory(category_id) => {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        PostScope::ByAuthor(author_id) => {
            builder.push(" AND p.author_id = ").push_bind(author_id);
        }
    }
    if !query.include_hidden {
        builder.push(" AND p.is_published AND c.is_published IS TRUE");
    }
    if !query.include_future {
        builder.push(" AND p.pub_date <= ").push_bind(now);
    }
}

fn list_posts_query<'args>(
    query: &PostQuery,
    now: DateTime<Utc>,
    pagination: Pagination,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = select_posts();
    push_post_filters(&mut builder, query, now);
    builder
        .push(" ORDER BY p.pub_date DESC, p.id ASC LIMIT ")
        .push_bind(pagination.limit())
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    builder
}

fn count_posts_query<'args>(query: &PostQuery, now: DateTime<Utc>) -> QueryBuilder<'args, Postgres> {
    let mut builder =
        QueryBuilder::new("SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id");
    push_post_filters(&mut builder, query, now);
    builder
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut builder = QueryBuilder::new(
            "WITH p AS (INSERT INTO posts \
             (title, text, pub_date, is_published, author_id, category_id, location_id, image) \
             VALUES (",
        );
        let mut values = builder.separated(", ");
        values
            .push_bind(input.title)
            .push_bind(input.text)
            .push_bind(input.pub_date)
            .push_bind(input.is_published)
            .push_bind(input.author_id)
            .push_bind(input.category_id)
            .push_bind(input.location_id)
            .push_bind(input.image);
        builder
            .push(") RETURNING *)")
            .push(POST_COLUMNS)
            .push(" FROM p")
            .push(POST_JOINS);

        let row = builder
            .build_query_as::<PostRow>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(map_row_to_post(row).post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut builder = select_posts();
        builder.push(" WHERE p.id = ").push_bind(id);

        let row = builder
            .build_query_as::<PostRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(row.map(|row| map_row_to_post(row).post))
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let mut builder = QueryBuilder::new("WITH p AS (UPDATE posts SET title = ");
        builder
            .push_bind(patch.title)
            .push(", text = ")
            .push_bind(patch.text)
            .push(", pub_date = ")
            .push_bind(patch.pub_date)
            .push(", is_published = ")
            .push_bind(patch.is_published)
            .push(", category_id = ")
            .push_bind(patch.category_id)
            .push(", location_id = ")
            .push_bind(patch.location_id)
            .push(", image = ")
            .push_bind(patch.image)
            .push(" WHERE id = ")
            .push_bind(post_id)
            .push(" AND author_id = ")
            .push_bind(owner_id)
            .push(" RETURNING *)")
            .push(POST_COLUMNS)
            .push(" FROM p")
            .push(POST_JOINS);

        let row = builder
            .build_query_as::<PostRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(row.map(|row| map_row_to_post(row).post))
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND author_id = $2
            "#,
        )
        .bind(post_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        now: DateTime<Utc>,
        pagination: Pagination,
    ) -> Result<Vec<AnnotatedPost>, DomainError> {
        let rows = list_posts_query(query, now, pagination)
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(map_row_to_post).collect())
    }

    async fn count_posts(&self, query: &PostQuery, now: DateTime<Utc>) -> Result<i64, DomainError> {
        count_posts_query(query, now)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }
}

fn map_row_to_post(row: PostRow) -> AnnotatedPost {
    let category = match (
        row.category_id,
        row.category_title,
        row.category_slug,
        row.category_is_published,
        row.category_created_at,
    ) {
        (Some(id), Some(title), Some(slug), Some(is_published), Some(created_at)) => {
            Some(Category {
                id,
                title,
                description: row.category_description.unwrap_or_default(),
                slug,
                is_published,
                created_at,
            })
        }
        _ => None,
    };

    let location = match (
        row.location_id,
        row.location_name,
        row.location_is_published,
        row.location_created_at,
    ) {
        (Some(id), Some(name), Some(is_published), Some(created_at)) => Some(Location {
            id,
            name,
            is_published,
            created_at,
        }),
        _ => None,
    };

    AnnotatedPost {
        post: Post {
            id: row.id,
            title: row.title,
            text: row.text,
            pub_date: row.pub_date,
            is_published: row.is_published,
            author: Author {
                id: row.author_id,
                username: row.author_username,
            },
            category,
            location,
            image: row.image,
            created_at: row.created_at,
        },
        comment_count: row.comment_count,
    }
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    map_foreign_key_violation(&err, |constraint| match constraint {
        Some("posts_category_id_fkey") => "category",
        Some("posts_location_id_fkey") => "location",
        _ => "author",
    })
    .unwrap_or_else(|| DomainError::Unexpected(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{count_posts_query, list_posts_query};
    use crate::data::post_query::{PostQuery, PostScope};
    use crate::data::post_repository::Pagination;

    const PAGE: Pagination = Pagination {
        page: 2,
        page_size: 10,
    };

    #[test]
    fn public_feed_filters_hidden_and_future_posts() {
        let builder = list_posts_query(&PostQuery::public(PostScope::All), Utc::now(), PAGE);
        let sql = builder.sql();

        assert!(sql.contains("AND p.is_published AND c.is_published IS TRUE"));
        assert!(sql.contains("AND p.pub_date <= $1"));
        assert!(sql.contains("ORDER BY p.pub_date DESC, p.id ASC LIMIT $2 OFFSET $3"));
        assert!(sql.contains("LEFT JOIN categories c"));
        assert!(sql.contains("JOIN users u"));
        assert!(sql.contains("LEFT JOIN locations l"));
        assert!(sql.contains("AS comment_count"));
    }

    #[test]
    fn category_feed_binds_category_first() {
        let builder = list_posts_query(&PostQuery::public(PostScope::ByCategory(4)), Utc::now(), PAGE);
        let sql = builder.sql();

        assert!(sql.contains("AND p.category_id = $1"));
        assert!(sql.contains("AND p.pub_date <= $2"));
    }

    #[test]
    fn owner_listing_skips_visibility_filters() {
        let builder = list_posts_query(&PostQuery::owner(9), Utc::now(), PAGE);
        let sql = builder.sql();

        assert!(sql.contains("AND p.author_id = $1"));
        assert!(!sql.contains("is_published AND"));
        assert!(!sql.contains("p.pub_date <="));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn count_uses_same_filters_without_ordering() {
        let builder = count_posts_query(&PostQuery::public(PostScope::ByAuthor(2)), Utc::now());
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT COUNT(*) FROM posts p"));
        assert!(sql.contains("AND p.author_id = $1"));
        assert!(sql.contains("AND p.pub_date <= $2"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn pagination_offsets_by_page() {
        assert_eq!(PAGE.limit(), 10);
        assert_eq!(PAGE.offset(), 10);
        let first = Pagination {
            page: 1,
            page_size: 5,
        };
        assert_eq!(first.offset(), 0);
    }
}
