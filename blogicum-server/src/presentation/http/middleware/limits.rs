use std::time::Duration;

use axum::{BoxError, Router, error_handling::HandleErrorLayer, http::StatusCode};
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::limit::RequestBodyLimitLayer;

#[derive(Debug, Clone, Copy)]
pub(crate) struct HttpLimits {
    pub(crate) body_limit_bytes: usize,
    pub(crate) concurrency: usize,
    pub(crate) timeout: Duration,
}

async fn handle_limit_error(err: BoxError) -> (StatusCode, &'static str) {
    if err.is::<Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "service unavailable")
    }
}

/// The concurrency cap is one semaphore shared by every route.
pub(crate) fn apply_limits(router: Router, limits: HttpLimits) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_limit_error))
            .layer(GlobalConcurrencyLimitLayer::new(limits.concurrency))
            .layer(TimeoutLayer::new(limits.timeout))
            .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes)),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
    };
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::{HttpLimits, apply_limits};

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request must build")
    }

    #[tokio::test]
    async fn concurrency_cap_is_shared_across_routes() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let slow = {
            let entered = entered.clone();
            let release = release.clone();
            move || async move {
                entered.notify_one();
                release.notified().await;
                "slow"
            }
        };
        let app = apply_limits(
            Router::new()
                .route("/slow", get(slow))
                .route("/fast", get(|| async { "fast" })),
            HttpLimits {
                body_limit_bytes: 1024,
                concurrency: 1,
                timeout: Duration::from_secs(30),
            },
        );

        let held = tokio::spawn(app.clone().oneshot(request("/slow")));
        entered.notified().await;

        let fast = app.clone().oneshot(request("/fast"));
        let blocked = tokio::time::timeout(Duration::from_millis(100), fast).await;
        assert!(blocked.is_err(), "/fast must wait while /slow holds the only slot");

        release.notify_one();
        let slow = held
            .await
            .expect("task must join")
            .expect("router is infallible");
        assert_eq!(slow.status(), StatusCode::OK);

        let fast = app
            .oneshot(request("/fast"))
            .await
            .expect("router is infallible");
        assert_eq!(fast.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = apply_limits(
            Router::new().route("/echo", post(|body: String| async move { body })),
            HttpLimits {
                body_limit_bytes: 8,
                concurrency: 4,
                timeout: Duration::from_secs(30),
            },
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .body(Body::from("far more than eight bytes"))
                    .expect("request must build"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
