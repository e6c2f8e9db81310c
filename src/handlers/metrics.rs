use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use super::AppState;
use crate::models::plain_text_error;

pub const METRICS_ROUTE: &str = "/metrics";

/// Handler for Prometheus metrics endpoint
#[instrument(name = "metrics_handler", skip(state))]
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            plain_text_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics")
        }
    }
}
