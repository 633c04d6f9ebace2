//! Span export to a Zipkin collector.
//!
//! # Responsibilities
//! - Build the tracer provider resource that names the service
//! - Configure the batch processor from [`TelemetryConfig`]
//! - POST finished spans to the collector as Zipkin v2 JSON
//!
//! # Design Decisions
//! - The batch processor runs on its own thread and holds at most
//!   `max_queue_size` spans; spans past that bound are dropped, not buffered
//! - Export is fire-and-forget: failures are logged by the SDK, never surfaced

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{BatchConfig, BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_zipkin::ZipkinExporter;
use thiserror::Error;

use crate::config::TelemetryConfig;

/// Errors while setting up span export.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build collector client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("collector client thread panicked")]
    ClientThread,

    #[error("failed to build zipkin exporter: {0}")]
    Exporter(String),
}

/// Resource attached to every span of `service_name`.
pub fn resource(service_name: &str) -> Resource {
    Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", service_name.to_string())])
        .build()
}

pub fn batch_config(config: &TelemetryConfig) -> BatchConfig {
    BatchConfigBuilder::default()
        .with_max_queue_size(config.max_queue_size)
        .with_max_export_batch_size(config.batch_size)
        .with_scheduled_delay(Duration::from_millis(config.flush_interval_ms))
        .build()
}

/// The blocking client owns a private runtime, so it is built off the caller's.
fn collector_client(timeout: Duration) -> Result<reqwest::blocking::Client, TelemetryError> {
    let client = std::thread::spawn(move || reqwest::blocking::Client::builder().timeout(timeout).build())
        .join()
        .map_err(|_| TelemetryError::ClientThread)??;
    Ok(client)
}

/// Tracer provider that batches spans of `service_name` to the collector.
pub fn zipkin_provider(service_name: &str, config: &TelemetryConfig) -> Result<SdkTracerProvider, TelemetryError> {
    let client = collector_client(Duration::from_millis(config.export_timeout_ms))?;
    let exporter = ZipkinExporter::builder()
        .with_collector_endpoint(config.zipkin_endpoint.clone())
        .with_http_client(client)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(batch_config(config))
        .build();

    tracing::info!(
        endpoint = %config.zipkin_endpoint,
        batch_size = config.batch_size,
        max_queue_size = config.max_queue_size,
        flush_interval_ms = config.flush_interval_ms,
        "Span exporter started"
    );

    Ok(SdkTracerProvider::builder()
        .with_resource(resource(service_name))
        .with_span_processor(processor)
        .build())
}
