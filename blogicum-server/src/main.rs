use std::sync::Arc;

use anyhow::Result;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use application::blog_service::BlogService;
use application::profile_service::ProfileService;
use data::repositories::postgres::category_repository::PostgresCategoryRepository;
use data::repositories::postgres::comment_repository::PostgresCommentRepository;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level, settings.log_format)?;

    let pool = create_pool(&settings.database_url, settings.database_max_connections).await?;
    run_migrations(&pool).await?;

    let jwt = Arc::new(JwtService::new(
        &settings.jwt_secret,
        settings.jwt_ttl_seconds,
    ));
    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let posts = Arc::new(PostgresPostRepository::new(pool.clone()));
    let comments = Arc::new(PostgresCommentRepository::new(pool.clone()));
    let categories = Arc::new(PostgresCategoryRepository::new(pool));

    let auth_service = Arc::new(AuthService::new(users.clone(), jwt.clone()));
    let blog_service = Arc::new(BlogService::new(
        posts,
        comments,
        categories,
        users.clone(),
        settings.posts_per_page,
    ));
    let profile_service = Arc::new(ProfileService::new(users));

    let state = AppState::new(auth_service, blog_service, profile_service, jwt);
    server::run_http(&settings, state).await
}
