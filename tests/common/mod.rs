use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use reqwest::Client;
use sentence_rs::{
    create_app, services::DelaySource, AppState, LifecycleController, Metrics, OperationTracer,
    RunningServer,
};

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub metrics: Arc<Metrics>,
    pub controller: LifecycleController,
    pub server: RunningServer,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5)).await
    }

    pub async fn with_timeout(shutdown_timeout: Duration) -> Self {
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let state = AppState::new(metrics.clone(), OperationTracer::noop())
            .with_delay_source(DelaySource::from_seed(2024));
        Self::start(create_app(state), metrics, shutdown_timeout).await
    }

    pub async fn start(app: Router, metrics: Arc<Metrics>, shutdown_timeout: Duration) -> Self {
        let controller = LifecycleController::new(shutdown_timeout);
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = controller
            .start(addr, app)
            .await
            .expect("Failed to start test server");

        Self {
            client: Client::new(),
            base_url: format!("http://{}", server.local_addr()),
            metrics,
            controller,
            server,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request_count(&self, method: &str, route: &str, status: &str) -> f64 {
        self.metrics
            .http_requests_total
            .with_label_values(&[method, route, status])
            .get()
    }

    pub fn sample_count(&self, method: &str, route: &str) -> u64 {
        self.metrics
            .http_request_duration_seconds
            .with_label_values(&[method, route])
            .get_sample_count()
    }
}
