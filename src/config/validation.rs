//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1)
//! - Validate addresses and URLs before any subsystem starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure functions: config → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{
    BackConfig, FrontConfig, ListenerConfig, LocationProviderConfig, ObservabilityConfig, RetryConfig,
    TelemetryConfig, TemperatureProviderConfig, TimeoutConfig,
};
use crate::weather::cep;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Configurations that can check themselves after parsing.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for FrontConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_listener(&self.listener, &mut errors);
        // The hop-2 client speaks plain HTTP only.
        check_url("upstream.weather_service_url", &self.upstream.weather_service_url, &["http"], &mut errors);
        check_retries(&self.retries, &mut errors);
        check_timeouts(&self.timeouts, &mut errors);
        check_attempt_budget(&self.timeouts, &mut errors);
        check_telemetry(&self.telemetry, &mut errors);
        check_observability(&self.observability, &mut errors);
        finish(errors)
    }
}

impl Validate for BackConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_listener(&self.listener, &mut errors);
        match &self.resolvers.location {
            LocationProviderConfig::ViaCep { base_url } => {
                check_http_url("resolvers.location.base_url", base_url, &mut errors);
            }
            LocationProviderConfig::Static { entries } => {
                for key in entries.keys().filter(|k| !cep::validate(k)) {
                    errors.push(ValidationError::new(
                        "resolvers.location.entries",
                        format!("'{key}' is not an 8-digit CEP"),
                    ));
                }
            }
        }
        match &self.resolvers.temperature {
            TemperatureProviderConfig::WeatherApi { base_url, api_key } => {
                check_http_url("resolvers.temperature.base_url", base_url, &mut errors);
                if api_key.is_empty() {
                    errors.push(ValidationError::new("resolvers.temperature.api_key", "must be set"));
                }
            }
            TemperatureProviderConfig::Static { celsius } => {
                if !celsius.is_finite() {
                    errors.push(ValidationError::new("resolvers.temperature.celsius", "must be finite"));
                }
            }
        }
        check_timeouts(&self.timeouts, &mut errors);
        check_telemetry(&self.telemetry, &mut errors);
        check_observability(&self.observability, &mut errors);
        finish(errors)
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_listener(listener: &ListenerConfig, errors: &mut Vec<ValidationError>) {
    check_socket_addr("listener.bind_address", &listener.bind_address, errors);
}

fn check_socket_addr(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{value}' is not a socket address")));
    }
}

fn check_http_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    check_url(field, value, &["http", "https"], errors);
}

fn check_url(field: &str, value: &str, schemes: &[&str], errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) && url.has_host() => {}
        Ok(_) => errors.push(ValidationError::new(
            field,
            format!("'{value}' must be a {} URL", schemes.join("/")),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("'{value}': {e}"))),
    }
}

fn check_retries(retries: &RetryConfig, errors: &mut Vec<ValidationError>) {
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new("retries.base_delay_ms", "must not exceed max_delay_ms"));
    }
}

fn check_timeouts(timeouts: &TimeoutConfig, errors: &mut Vec<ValidationError>) {
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if timeouts.upstream_attempt_ms == 0 {
        errors.push(ValidationError::new("timeouts.upstream_attempt_ms", "must be greater than 0"));
    }
    if timeouts.resolver_ms == 0 {
        errors.push(ValidationError::new("timeouts.resolver_ms", "must be greater than 0"));
    }
}

/// The back service may spend `resolver_ms` on each of its two lookups.
fn check_attempt_budget(timeouts: &TimeoutConfig, errors: &mut Vec<ValidationError>) {
    let worst_case = timeouts.resolver_ms.saturating_mul(2);
    if timeouts.upstream_attempt_ms <= worst_case {
        errors.push(ValidationError::new(
            "timeouts.upstream_attempt_ms",
            format!("must exceed twice resolver_ms ({worst_case} ms)"),
        ));
    }
}

fn check_telemetry(telemetry: &TelemetryConfig, errors: &mut Vec<ValidationError>) {
    if !telemetry.enabled {
        return;
    }
    check_http_url("telemetry.zipkin_endpoint", &telemetry.zipkin_endpoint, errors);
    if telemetry.batch_size == 0 {
        errors.push(ValidationError::new("telemetry.batch_size", "must be greater than 0"));
    }
    if telemetry.max_queue_size < telemetry.batch_size {
        errors.push(ValidationError::new("telemetry.max_queue_size", "must be at least batch_size"));
    }
    if telemetry.flush_interval_ms == 0 {
        errors.push(ValidationError::new("telemetry.flush_interval_ms", "must be greater than 0"));
    }
}

fn check_observability(observability: &ObservabilityConfig, errors: &mut Vec<ValidationError>) {
    if !matches!(observability.log_level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled {
        check_socket_addr("observability.metrics_address", &observability.metrics_address, errors);
    }
}
