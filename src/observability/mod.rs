//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and clients produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → trace.rs (OpenTelemetry spans)
//!     → propagation.rs (W3C traceparent in and out)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//!     → exporter.rs → Zipkin collector (bounded batch queue)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs, spans and the hop-2 request
//! - Telemetry failures never affect request handling

pub mod exporter;
pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod trace;

pub use exporter::TelemetryError;
pub use logging::init_logging;
pub use trace::{SpanGuard, SpanKind, Tracer};
