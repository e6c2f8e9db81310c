use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{self, RandomIdGenerator, Sampler},
    Resource,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use super::spans::OperationTracer;
use crate::config::ObservabilityConfig;

/// Upper bound on flushing buffered spans at shutdown.
pub const TRACER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to initialize OpenTelemetry: {0}")]
    OpenTelemetryInit(#[from] opentelemetry::trace::TraceError),
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install the global subscriber (structured logs plus, when enabled, the
/// OpenTelemetry bridge) and return the tracer handlers should use for
/// operation spans.
pub fn init_observability(
    config: &ObservabilityConfig,
) -> Result<OperationTracer, ObservabilityError> {
    let tracer = if config.tracing_enabled {
        Some(init_opentelemetry_tracer(config)?)
    } else {
        None
    };

    let opentelemetry_layer = tracer.clone().map(OpenTelemetryLayer::new);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "sentence_rs={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    if config.enable_json_logging {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::NONE);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(opentelemetry_layer)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(opentelemetry_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_span_events(FmtSpan::NONE),
            )
            .try_init()
            .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    }

    info!(
        service = %config.service_name,
        version = %config.service_version,
        tracing_enabled = config.tracing_enabled,
        "Observability initialized"
    );

    Ok(match tracer {
        Some(tracer) => OperationTracer::otel(tracer),
        None => OperationTracer::noop(),
    })
}

fn init_opentelemetry_tracer(
    config: &ObservabilityConfig,
) -> Result<opentelemetry_sdk::trace::Tracer, ObservabilityError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("environment", config.environment.clone()),
    ]);

    // Plaintext gRPC; the collector is expected on the local network.
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            trace::config()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .with_batch_config(
            trace::BatchConfig::default()
                .with_max_queue_size(2048)
                .with_max_export_batch_size(512)
                .with_scheduled_delay(Duration::from_millis(500)),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    info!(endpoint = %config.otlp_endpoint, "OpenTelemetry tracer initialized");
    Ok(tracer)
}

/// Flush and shut down the tracer provider, giving up after
/// [`TRACER_SHUTDOWN_TIMEOUT`].
pub async fn shutdown_observability() {
    info!("Shutting down observability");

    // Provider shutdown blocks until pending spans are exported.
    let shutdown_task = tokio::task::spawn_blocking(|| {
        global::shutdown_tracer_provider();
    });

    match tokio::time::timeout(TRACER_SHUTDOWN_TIMEOUT, shutdown_task).await {
        Ok(Ok(())) => {
            info!("Observability shutdown completed successfully");
        }
        Ok(Err(e)) => {
            warn!("Error during observability shutdown: {}", e);
        }
        Err(_) => {
            warn!(
                "Observability shutdown timed out after {:?}",
                TRACER_SHUTDOWN_TIMEOUT
            );
        }
    }
}
