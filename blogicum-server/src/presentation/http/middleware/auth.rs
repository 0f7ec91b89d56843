use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::domain::policy::Viewer;
use crate::infrastructure::jwt::JwtService;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Whoever is asking, signed in or not. Never rejects.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CurrentViewer(pub(crate) Viewer);

impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| user.user_id);
        Ok(CurrentViewer(Viewer::from(user_id)))
    }
}

/// `Some(token)` for a well-formed `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn authenticate(jwt: &JwtService, headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let token = bearer_token(headers)?;
    match jwt.verify(token) {
        Ok(claims) => Some(AuthenticatedUser {
            user_id: claims.sub,
        }),
        Err(err) => {
            debug!(error = %err, "bearer token rejected");
            None
        }
    }
}

/// Requires a valid bearer token.
pub(crate) async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state.jwt, request.headers()).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Attaches the user when a valid bearer token is present; otherwise the
/// request proceeds anonymously.
pub(crate) async fn identify_viewer_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = authenticate(&state.jwt, request.headers()) {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}
