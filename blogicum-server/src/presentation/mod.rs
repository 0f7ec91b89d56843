use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::application::profile_service::ProfileService;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService>,
    pub(crate) blog_service: Arc<BlogService>,
    pub(crate) profile_service: Arc<ProfileService>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(
        auth_service: Arc<AuthService>,
        blog_service: Arc<BlogService>,
        profile_service: Arc<ProfileService>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            auth_service,
            blog_service,
            profile_service,
            jwt,
        }
    }
}
