pub mod api;
pub mod metrics;

pub use api::*;
pub use metrics::*;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::models::plain_text_error;
use crate::observability::{
    capture_status, logging_middleware, request_tracing_middleware, Metrics, OperationTracer,
};
use crate::services::DelaySource;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub tracer: OperationTracer,
    pub delays: Arc<DelaySource>,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>, tracer: OperationTracer) -> Self {
        Self {
            metrics,
            tracer,
            delays: Arc::new(DelaySource::from_time()),
        }
    }

    pub fn with_delay_source(mut self, delays: DelaySource) -> Self {
        self.delays = Arc::new(delays);
        self
    }
}

/// Build the application router with the full instrumentation pipeline
pub fn create_app(state: AppState) -> Router {
    let routes = Router::new()
        // Any non-empty text is echoed, whatever its size.
        .route(
            SENTENCE_ROUTE,
            post(generate_sentence).layer(DefaultBodyLimit::disable()),
        )
        .route(RANDOM_DELAY_ROUTE, get(random_delay))
        .route(FAIL_ROUTE, get(failing_endpoint))
        .route(METRICS_ROUTE, get(metrics_handler))
        .with_state(state);

    instrument(routes)
}

/// Wrap `router` in the request pipeline (outer to inner): logging, status
/// capture, request tracing, panic recovery.
pub fn instrument(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(request_tracing_middleware))
        .layer(middleware::from_fn(capture_status))
        .layer(middleware::from_fn(logging_middleware))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    error!(panic = detail, "Handler panicked");

    plain_text_error(
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    async fn panicking() -> &'static str {
        panic!("handler bug")
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_server_error() {
        let app = instrument(Router::new().route("/boom", get(panicking)));

        let request = axum::http::Request::builder()
            .uri("/boom")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Internal Server Error\n");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = create_app(AppState::new(metrics.clone(), OperationTracer::noop()));

        let request = axum::http::Request::builder()
            .uri("/api/v2/sentence")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = create_app(AppState::new(metrics, OperationTracer::noop()));

        let request = axum::http::Request::builder()
            .uri(SENTENCE_ROUTE)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
