//! Distributed tracing support.
//!
//! # Responsibilities
//! - Create a root span per inbound request and child spans per step
//! - Attach the service identity to every span through the provider resource
//! - Count started spans so tests can check every one was delivered
//!
//! # Design Decisions
//! - The tracer is an explicit value carried in handler state, not the
//!   OpenTelemetry global
//! - [`SpanGuard`] ends its span on drop, so early returns and cancelled
//!   futures still close every span exactly once
//! - Starting or ending a span never fails; export problems stay in the SDK

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::{SpanContext, Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue, Value};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider, SpanExporter};

pub use opentelemetry::trace::SpanKind;

use crate::config::TelemetryConfig;
use crate::observability::exporter::{self, TelemetryError};

const INSTRUMENTATION_SCOPE: &str = "cep-weather";

struct TracerInner {
    service_name: String,
    provider: SdkTracerProvider,
    tracer: SdkTracer,
    started: AtomicU64,
}

/// Factory for spans, shared by every handler of one service.
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl Tracer {
    /// Wrap an already configured provider.
    pub fn new(service_name: impl Into<String>, provider: SdkTracerProvider) -> Self {
        let tracer = provider.tracer(INSTRUMENTATION_SCOPE);
        Self {
            inner: Arc::new(TracerInner {
                service_name: service_name.into(),
                provider,
                tracer,
                started: AtomicU64::new(0),
            }),
        }
    }

    /// Batch export to the Zipkin collector named in `config`.
    pub fn zipkin(service_name: &str, config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let provider = exporter::zipkin_provider(service_name, config)?;
        Ok(Self::new(service_name, provider))
    }

    /// Hand each span to `exporter` as soon as it ends.
    pub fn with_exporter<E>(service_name: &str, exporter: E) -> Self
    where
        E: SpanExporter + 'static,
    {
        let provider = SdkTracerProvider::builder()
            .with_resource(exporter::resource(service_name))
            .with_simple_exporter(exporter)
            .build();
        Self::new(service_name, provider)
    }

    /// Spans are created and propagated but never exported.
    pub fn disabled(service_name: &str) -> Self {
        let provider = SdkTracerProvider::builder()
            .with_resource(exporter::resource(service_name))
            .build();
        Self::new(service_name, provider)
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    /// Number of spans started so far.
    pub fn spans_started(&self) -> u64 {
        self.inner.started.load(Ordering::Relaxed)
    }

    /// Start a span with no local parent, continuing `remote_parent` if given.
    pub fn start_root(
        &self,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        remote_parent: Option<Context>,
    ) -> SpanGuard {
        let parent = remote_parent.unwrap_or_default();
        self.start_span(&parent, name, kind)
    }

    /// Start a child of the span carried by `parent`.
    pub fn start_span(&self, parent: &Context, name: impl Into<Cow<'static, str>>, kind: SpanKind) -> SpanGuard {
        self.inner.started.fetch_add(1, Ordering::Relaxed);
        let span = self
            .inner
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.inner.tracer, parent);
        SpanGuard { cx: parent.with_span(span) }
    }

    /// Flush pending spans and stop the provider, waiting at most `timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        let provider = self.inner.provider.clone();
        let flush = tokio::task::spawn_blocking(move || provider.shutdown());
        match tokio::time::timeout(timeout, flush).await {
            Ok(Ok(Ok(()))) => tracing::debug!("Tracer provider shut down"),
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Failed to flush spans on shutdown"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Span flush task failed"),
            Err(_) => tracing::warn!("Timed out flushing spans on shutdown"),
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service_name", &self.inner.service_name)
            .field("spans_started", &self.spans_started())
            .finish()
    }
}

/// An open span. Ends when [`SpanGuard::end`] is called or the guard drops.
pub struct SpanGuard {
    cx: Context,
}

impl SpanGuard {
    /// Context to parent nested work on.
    pub fn context(&self) -> Context {
        self.cx.clone()
    }

    pub fn span_context(&self) -> SpanContext {
        self.cx.span().span_context().clone()
    }

    pub fn set_attribute(&mut self, key: &'static str, value: impl Into<Value>) {
        self.cx.span().set_attribute(KeyValue::new(key, value));
    }

    /// Mark the span as failed.
    pub fn set_error(&mut self, message: impl Into<Cow<'static, str>>) {
        self.cx.span().set_status(Status::error(message));
    }

    pub fn end(self) {}
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        // Ending twice is a no-op in the SDK.
        self.cx.span().end();
    }
}
