use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Request counters and duration histograms shared by every handler.
///
/// Each instance owns its own registry, so tests can build as many as they
/// like without colliding on metric names.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: IntGaugeVec,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .buckets(prometheus::DEFAULT_BUCKETS.to_vec()),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = IntGaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_request(&self, method: &str, route: &str, status_code: u16) {
        let status = status_code.to_string();
        self.http_requests_total
            .with_label_values(&[method, route, &status])
            .inc();
    }

    pub fn observe_duration(&self, method: &str, route: &str, duration_seconds: f64) {
        self.http_request_duration_seconds
            .with_label_values(&[method, route])
            .observe(duration_seconds);
    }

    /// Start observing one invocation of `route`.
    ///
    /// The returned guard records exactly one counter increment and one
    /// duration sample, either through [`RouteObservation::finish`] or, if the
    /// handler never gets there, with status 500 when the guard is dropped.
    pub fn observe_route(
        self: &Arc<Self>,
        method: &'static str,
        route: &'static str,
    ) -> RouteObservation {
        self.http_requests_in_flight
            .with_label_values(&[method, route])
            .inc();

        RouteObservation {
            metrics: Arc::clone(self),
            method,
            route,
            started: Instant::now(),
            finished: false,
        }
    }
}

/// Pending measurement of a single handler invocation
pub struct RouteObservation {
    metrics: Arc<Metrics>,
    method: &'static str,
    route: &'static str,
    started: Instant,
    finished: bool,
}

impl RouteObservation {
    pub fn finish(mut self, status_code: u16) {
        self.record(status_code);
    }

    fn record(&mut self, status_code: u16) {
        if self.finished {
            return;
        }
        self.finished = true;

        let duration_seconds = self.started.elapsed().as_secs_f64();
        self.metrics
            .record_request(self.method, self.route, status_code);
        self.metrics
            .observe_duration(self.method, self.route, duration_seconds);
        self.metrics
            .http_requests_in_flight
            .with_label_values(&[self.method, self.route])
            .dec();
    }
}

impl Drop for RouteObservation {
    fn drop(&mut self) {
        // Abandoned: the handler panicked or its future was cancelled.
        self.record(500);
    }
}
