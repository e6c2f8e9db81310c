use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::{
    atomic::{AtomicU16, Ordering},
    Arc,
};

const UNSET: u16 = 0;

/// Status code written for a request, shared between the middleware that
/// produces the response and the middleware that reports on it.
///
/// Reads before any write report `200 OK`. Only the first write is kept;
/// later writes are ignored the same way a second status line would be.
#[derive(Debug, Clone, Default)]
pub struct CapturedStatus {
    code: Arc<AtomicU16>,
}

impl CapturedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `status` unless a status was already captured. Returns whether
    /// this call was the one that stored it.
    pub fn record(&self, status: StatusCode) -> bool {
        self.code
            .compare_exchange(UNSET, status.as_u16(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_recorded(&self) -> bool {
        self.code.load(Ordering::Acquire) != UNSET
    }

    pub fn status(&self) -> StatusCode {
        match self.code.load(Ordering::Acquire) {
            UNSET => StatusCode::OK,
            code => StatusCode::from_u16(code).unwrap_or(StatusCode::OK),
        }
    }
}

/// Records the status of the response flowing back through this layer into
/// the request's [`CapturedStatus`], leaving the response untouched.
pub async fn capture_status(request: Request, next: Next) -> Response {
    let captured = request.extensions().get::<CapturedStatus>().cloned();

    let response = next.run(request).await;

    if let Some(captured) = captured {
        captured.record(response.status());
    }

    response
}
