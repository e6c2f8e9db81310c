use std::sync::Arc;
use tracing::{error, info};

use sentence_rs::{
    create_app, init_observability,
    lifecycle::shutdown_signal,
    shutdown_observability, AppState, Config, LifecycleController, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()?;

    let tracer = init_observability(&config.observability)?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);
    let app = create_app(AppState::new(metrics, tracer));

    let addr = config.server.socket_addr()?;
    let controller = LifecycleController::new(config.server.shutdown_timeout());

    let server = match controller.start(addr, app).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "listen failed");
            shutdown_observability().await;
            return Err(e.into());
        }
    };

    info!(
        "Prometheus metrics are available at http://{}/metrics",
        server.local_addr()
    );

    server
        .run_until(shutdown_signal(), shutdown_observability())
        .await?;

    Ok(())
}
