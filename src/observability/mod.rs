pub mod capture;
pub mod metrics;
pub mod middleware;
pub mod spans;
pub mod tracing;

pub use capture::{capture_status, CapturedStatus};
pub use metrics::{Metrics, MetricsError, RouteObservation};
pub use middleware::{logging_middleware, request_tracing_middleware};
pub use spans::{OperationSpan, OperationTracer, RecordedSpan, SpanRecorder};
pub use self::tracing::{
    init_observability, shutdown_observability, ObservabilityError, TRACER_SHUTDOWN_TIMEOUT,
};
