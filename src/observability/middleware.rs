use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use opentelemetry::{global, propagation::Extractor, trace::TraceContextExt};
use std::time::Instant;
use tracing::{error, info, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::capture::CapturedStatus;

/// Logs one line per request with method, path, captured status and duration.
///
/// The line is written when the request finishes, including when the inner
/// handler panics or the request future is dropped before completing.
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let captured = CapturedStatus::new();
    request.extensions_mut().insert(captured.clone());

    let _log = RequestLog {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        captured,
        started: Instant::now(),
    };

    next.run(request).await
}

struct RequestLog {
    method: Method,
    path: String,
    captured: CapturedStatus,
    started: Instant,
}

impl Drop for RequestLog {
    fn drop(&mut self) {
        let duration = self.started.elapsed();
        let duration_ms = duration.as_millis() as u64;
        let completed = self.captured.is_recorded();
        // Dropped before a response existed: report it the way the route
        // metrics do.
        let status = if completed {
            self.captured.status().as_u16()
        } else {
            500
        };

        if status >= 500 {
            error!(
                method = %self.method,
                path = %self.path,
                status,
                duration_ms,
                ?duration,
                completed,
                "Request completed"
            );
        } else if status >= 400 {
            warn!(
                method = %self.method,
                path = %self.path,
                status,
                duration_ms,
                ?duration,
                completed,
                "Request completed"
            );
        } else {
            info!(
                method = %self.method,
                path = %self.path,
                status,
                duration_ms,
                ?duration,
                completed,
                "Request completed"
            );
        }
    }
}

/// Opens a server span for every request, continuing any trace propagated in
/// the incoming `traceparent` header. Without a subscriber the span is
/// disabled and this layer only forwards the request.
pub async fn request_tracing_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let target = request.uri().to_string();

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let span_name = format!("{} {}", method, route);

    let span = tracing::info_span!(
        target: "sentence_rs::http",
        "http_request",
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %route,
        http.target = %target,
        http.user_agent = %user_agent,
        http.status_code = tracing::field::Empty,
        otel.status_code = tracing::field::Empty,
    );

    let remote = extract_remote_context(request.headers());
    if remote.span().span_context().is_valid() {
        span.set_parent(remote);
    }

    async move {
        let response = next.run(request).await;

        let status_code = response.status().as_u16();
        let current = tracing::Span::current();
        current.record("http.status_code", status_code);
        if status_code >= 500 {
            current.record("otel.status_code", "ERROR");
        }

        response
    }
    .instrument(span)
    .await
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}

fn extract_remote_context(headers: &HeaderMap) -> opentelemetry::Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}
