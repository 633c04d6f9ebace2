//! `POST /weather`: resolve a code to a city and a temperature.
//!
//! # States
//! ```text
//! Received → Validated → Resolved → Converted → Responded
//!     ↘ Rejected (400 malformed/missing, 422 invalid, 404 unknown, 500 temperature)
//! ```
//!
//! The code is re-validated here; this service is reachable without the
//! front service in between.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use opentelemetry::Context;

use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::observability::propagation::extract_context;
use crate::observability::trace::{SpanKind, Tracer};
use crate::resilience::timeouts::with_timeout;
use crate::weather::cep;
use crate::weather::resolver::{LocationResolver, TemperatureResolver};
use crate::weather::types::{PostalCodeRequest, WeatherResult};

/// Application state injected into back handlers.
#[derive(Clone)]
pub struct BackState {
    pub tracer: Tracer,
    pub location: Arc<dyn LocationResolver>,
    pub temperature: Arc<dyn TemperatureResolver>,
    /// Upper bound on each resolver call.
    pub resolver_timeout: Duration,
    /// Continue the caller's trace from `traceparent`.
    pub propagate_context: bool,
}

pub async fn weather_handler(State(state): State<BackState>, headers: HeaderMap, body: Bytes) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);
    let remote_parent = if state.propagate_context {
        extract_context(&headers)
    } else {
        None
    };

    let continued = remote_parent.is_some();
    let mut span = state.tracer.start_root("POST /weather", SpanKind::Server, remote_parent);
    span.set_attribute("http.method", "POST");
    span.set_attribute("http.route", "/weather");
    if let Some(id) = &request_id {
        span.set_attribute("request.id", id.clone());
    }

    let request_id = request_id.as_deref().unwrap_or("unknown");
    tracing::debug!(request_id, continued, "Handling weather request");

    let response = match handle(&state, &span.context(), &body, request_id).await {
        Ok(weather) => (StatusCode::OK, Json(weather)).into_response(),
        Err(e) => {
            tracing::warn!(request_id, status = e.status().as_u16(), error = %e, "Weather request failed");
            span.set_error(e.to_string());
            e.into_response()
        }
    };

    let status = response.status().as_u16();
    span.set_attribute("http.status_code", i64::from(status));
    span.end();
    metrics::record_request("back", "/weather", status, start_time);
    response
}

async fn handle(
    state: &BackState,
    root: &Context,
    body: &[u8],
    request_id: &str,
) -> Result<WeatherResult, ApiError> {
    let request: PostalCodeRequest = serde_json::from_slice(body).map_err(|e| ApiError::Format(e.to_string()))?;

    let code = {
        let mut span = state.tracer.start_span(root, "validate cep", SpanKind::Internal);
        match request.cep {
            None => {
                span.set_error("cep is required");
                return Err(ApiError::MissingCep);
            }
            Some(code) if !cep::validate(&code) => {
                span.set_error("invalid zipcode");
                return Err(ApiError::Validation);
            }
            Some(code) => code,
        }
    };

    let location = {
        let mut span = state.tracer.start_span(root, "resolve location", SpanKind::Internal);
        span.set_attribute("cep", code.clone());
        let outcome = with_timeout(state.resolver_timeout, state.location.resolve(&code)).await;
        match outcome {
            Ok(Ok(location)) => {
                metrics::record_resolver_call("location", "ok");
                span.set_attribute("city", location.city.clone());
                location
            }
            Ok(Err(e)) => {
                metrics::record_resolver_call("location", "error");
                tracing::info!(request_id, cep = %code, error = %e, "Location lookup failed");
                span.set_error(e.to_string());
                return Err(ApiError::NotFound);
            }
            Err(e) => {
                metrics::record_resolver_call("location", "timeout");
                tracing::warn!(request_id, cep = %code, error = %e, "Location lookup timed out");
                span.set_error(e.to_string());
                return Err(ApiError::NotFound);
            }
        }
    };

    let sample = {
        let mut span = state.tracer.start_span(root, "resolve temperature", SpanKind::Internal);
        span.set_attribute("city", location.city.clone());
        let outcome = with_timeout(state.resolver_timeout, state.temperature.resolve(&location.city)).await;
        match outcome {
            Ok(Ok(sample)) => {
                metrics::record_resolver_call("temperature", "ok");
                span.set_attribute("temp_c", sample.celsius);
                sample
            }
            Ok(Err(e)) => {
                metrics::record_resolver_call("temperature", "error");
                tracing::warn!(request_id, city = %location.city, error = %e, "Temperature lookup failed");
                span.set_error(e.to_string());
                return Err(ApiError::TemperatureUnavailable);
            }
            Err(e) => {
                metrics::record_resolver_call("temperature", "timeout");
                tracing::warn!(request_id, city = %location.city, error = %e, "Temperature lookup timed out");
                span.set_error(e.to_string());
                return Err(ApiError::TemperatureUnavailable);
            }
        }
    };

    Ok(WeatherResult::from_sample(location, sample))
}
