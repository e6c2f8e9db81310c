use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json, Response},
};
use opentelemetry::KeyValue;
use tracing::{debug, error, instrument, warn};

use super::AppState;
use crate::models::{ApiError, DelayedResponse, SentenceRequest};

pub const SENTENCE_ROUTE: &str = "/api/v1/sentence";
pub const RANDOM_DELAY_ROUTE: &str = "/api/v1/random-delay";
pub const FAIL_ROUTE: &str = "/api/v1/fail";

/// Echo the caller's text back as a sentence
#[instrument(name = "generate_sentence", skip_all)]
pub async fn generate_sentence(State(state): State<AppState>, body: Bytes) -> Response {
    let observation = state.metrics.observe_route("POST", SENTENCE_ROUTE);
    let mut span = state.tracer.start("GenerateSentence");

    let result = SentenceRequest::from_body(&body).and_then(|request| {
        debug!("Sentence request validated");
        request.into_sentence()
    });

    let response = match result {
        Ok(output) => {
            span.set_attribute(KeyValue::new("input.length", body.len() as i64));
            Json(output).into_response()
        }
        Err(err) => {
            warn!(error = %err, "Rejected sentence request");
            span.set_attribute(KeyValue::new("error", true));
            err.into_response()
        }
    };

    observation.finish(response.status().as_u16());
    span.end();
    response
}

/// Respond after sleeping for a random 0-500 ms
#[instrument(name = "random_delay", skip_all)]
pub async fn random_delay(State(state): State<AppState>) -> Response {
    let observation = state.metrics.observe_route("GET", RANDOM_DELAY_ROUTE);
    let mut span = state.tracer.start("RandomDelay");

    let delay = state.delays.draw();
    let delay_ms = delay.as_millis() as u64;
    span.set_attribute(KeyValue::new("delay.ms", delay_ms as i64));

    tokio::time::sleep(delay).await;
    debug!(delay_ms, "Random delay elapsed");

    let response = Json(DelayedResponse::new(delay_ms)).into_response();

    observation.finish(response.status().as_u16());
    span.end();
    response
}

/// Always fails with 500, to exercise the failure path of the pipeline
#[instrument(name = "failing_endpoint", skip_all)]
pub async fn failing_endpoint(State(state): State<AppState>) -> Response {
    let observation = state.metrics.observe_route("GET", FAIL_ROUTE);
    let mut span = state.tracer.start("FailingEndpoint");

    let err = ApiError::ForcedFailure;
    error!(error = %err, "Failing endpoint invoked");
    span.set_attribute(KeyValue::new("error", true));

    let response = err.into_response();

    observation.finish(response.status().as_u16());
    span.end();
    response
}
