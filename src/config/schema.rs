//! Configuration schema definitions.
//!
//! One root type per service. Both share the sub-sections below and derive
//! Serde traits for deserialization from TOML files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the front (CEP intake) service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where the back service lives.
    pub upstream: UpstreamConfig,

    /// Retry policy for the hop-2 call.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Span export settings.
    pub telemetry: TelemetryConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig { bind_address: "0.0.0.0:8081".to_string() },
            upstream: UpstreamConfig::default(),
            retries: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
            telemetry: TelemetryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl FrontConfig {
    pub fn service_name(&self) -> &str {
        self.telemetry.service_name.as_deref().unwrap_or("cep-service")
    }
}

/// Root configuration for the back (weather) service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Location and temperature providers.
    pub resolvers: ResolverConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Span export settings.
    pub telemetry: TelemetryConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for BackConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig { bind_address: "0.0.0.0:8082".to_string() },
            resolvers: ResolverConfig::default(),
            timeouts: TimeoutConfig::default(),
            telemetry: TelemetryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl BackConfig {
    pub fn service_name(&self) -> &str {
        self.telemetry.service_name.as_deref().unwrap_or("weather-service")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Location of the back service, as seen from the front service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; `/weather` is appended.
    pub weather_service_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            weather_service_url: "http://127.0.0.1:8082".to_string(),
        }
    }
}

/// Retry configuration for transport failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole inbound request, in seconds.
    pub request_secs: u64,

    /// Each hop-2 attempt, in milliseconds. Must outlast both resolver
    /// calls of the back service.
    pub upstream_attempt_ms: u64,

    /// Each provider call, in milliseconds. On the front service this is
    /// the back service's budget that `upstream_attempt_ms` is checked against.
    pub resolver_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_attempt_ms: 8000,
            resolver_ms: 3000,
        }
    }
}

/// Provider selection for the back service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub location: LocationProviderConfig,
    pub temperature: TemperatureProviderConfig,
}

/// CEP → city provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider")]
pub enum LocationProviderConfig {
    /// ViaCEP-compatible HTTP API.
    #[serde(rename = "viacep")]
    ViaCep {
        #[serde(default = "default_viacep_url")]
        base_url: String,
    },
    /// Fixed table, no network.
    #[serde(rename = "static")]
    Static {
        #[serde(default)]
        entries: BTreeMap<String, String>,
    },
}

impl Default for LocationProviderConfig {
    fn default() -> Self {
        LocationProviderConfig::ViaCep { base_url: default_viacep_url() }
    }
}

fn default_viacep_url() -> String {
    "https://viacep.com.br".to_string()
}

/// City → Celsius provider.
#[derive(Clone, Deserialize, Serialize)]
#[serde(tag = "provider")]
pub enum TemperatureProviderConfig {
    /// WeatherAPI-compatible HTTP API.
    #[serde(rename = "weatherapi")]
    WeatherApi {
        #[serde(default = "default_weatherapi_url")]
        base_url: String,
        #[serde(default)]
        api_key: String,
    },
    /// Same reading for every city, no network.
    #[serde(rename = "static")]
    Static { celsius: f64 },
}

impl Default for TemperatureProviderConfig {
    fn default() -> Self {
        TemperatureProviderConfig::WeatherApi {
            base_url: default_weatherapi_url(),
            api_key: String::new(),
        }
    }
}

impl std::fmt::Debug for TemperatureProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureProviderConfig::WeatherApi { base_url, api_key } => f
                .debug_struct("WeatherApi")
                .field("base_url", base_url)
                .field("api_key", &if api_key.is_empty() { "<unset>" } else { "<redacted>" })
                .finish(),
            TemperatureProviderConfig::Static { celsius } => {
                f.debug_struct("Static").field("celsius", celsius).finish()
            }
        }
    }
}

fn default_weatherapi_url() -> String {
    "https://api.weatherapi.com".to_string()
}

/// Span export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Export spans at all.
    pub enabled: bool,

    /// Service identity on every span; defaults per service.
    pub service_name: Option<String>,

    /// Zipkin v2 JSON endpoint.
    pub zipkin_endpoint: String,

    /// Spans per export request.
    pub batch_size: usize,

    /// Finished spans held for export; further spans are dropped.
    pub max_queue_size: usize,

    /// Longest a finished span waits before export, in milliseconds.
    pub flush_interval_ms: u64,

    /// Collector request timeout in milliseconds.
    pub export_timeout_ms: u64,

    /// Send and honour W3C `traceparent` across the hop.
    pub propagate_context: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: None,
            zipkin_endpoint: "http://localhost:9411/api/v2/spans".to_string(),
            batch_size: 100,
            max_queue_size: 2048,
            flush_interval_ms: 1000,
            export_timeout_ms: 5000,
            propagate_context: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
