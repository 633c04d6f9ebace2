//! Location and temperature resolvers.
//!
//! # Responsibilities
//! - Map a validated CEP to a city (ViaCEP-shaped API or a static table)
//! - Map a city to a Celsius reading (WeatherAPI-shaped API or a fixed value)
//! - Bound every outbound call with a client-level timeout
//!
//! # Design Decisions
//! - Single attempt per call; the back handler decides the status code
//! - "Not found" is its own error variant, never an empty city

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::{LocationProviderConfig, TemperatureProviderConfig};
use crate::weather::types::{LocationInfo, TemperatureSample};

/// Errors produced by a resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The provider answered but has no city for this code.
    #[error("location not found")]
    NotFound,

    /// The provider could not be reached or the call timed out.
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an unexpected status.
    #[error("provider returned status {0}")]
    Status(StatusCode),

    /// The provider body could not be decoded.
    #[error("invalid provider response: {0}")]
    Decode(String),

    /// The resolver could not be built from configuration.
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

/// Resolves a postal code to a city.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, cep: &str) -> Result<LocationInfo, ResolveError>;
}

/// Resolves a city to a temperature reading.
#[async_trait]
pub trait TemperatureResolver: Send + Sync {
    async fn resolve(&self, city: &str) -> Result<TemperatureSample, ResolveError>;
}

/// Build the location resolver described by `config`.
pub fn location_resolver(
    config: &LocationProviderConfig,
    timeout: Duration,
) -> Result<Arc<dyn LocationResolver>, ResolveError> {
    match config {
        LocationProviderConfig::ViaCep { base_url } => {
            Ok(Arc::new(ViaCepResolver::new(base_url, timeout)?))
        }
        LocationProviderConfig::Static { entries } => {
            Ok(Arc::new(StaticLocationResolver::new(entries.clone())))
        }
    }
}

/// Build the temperature resolver described by `config`.
pub fn temperature_resolver(
    config: &TemperatureProviderConfig,
    timeout: Duration,
) -> Result<Arc<dyn TemperatureResolver>, ResolveError> {
    match config {
        TemperatureProviderConfig::WeatherApi { base_url, api_key } => Ok(Arc::new(
            WeatherApiResolver::new(base_url, api_key.clone(), timeout)?,
        )),
        TemperatureProviderConfig::Static { celsius } => {
            Ok(Arc::new(StaticTemperatureResolver::new(*celsius)))
        }
    }
}

fn http_client(timeout: Duration) -> Result<Client, ResolveError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Parses `raw` as a base URL whose path ends in `/`, so that `join` appends.
fn base_url(raw: &str) -> Result<Url, ResolveError> {
    let mut url = Url::parse(raw).map_err(|e| ResolveError::Config(format!("{raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// ViaCEP lookup: `GET {base}/ws/{cep}/json/`.
#[derive(Debug, Clone)]
pub struct ViaCepResolver {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ViaCepBody {
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResolver {
    pub fn new(base_url_str: &str, timeout: Duration) -> Result<Self, ResolveError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url(base_url_str)?,
        })
    }
}

#[async_trait]
impl LocationResolver for ViaCepResolver {
    async fn resolve(&self, cep: &str) -> Result<LocationInfo, ResolveError> {
        let url = self
            .base_url
            .join(&format!("ws/{cep}/json/"))
            .map_err(|e| ResolveError::Config(e.to_string()))?;

        tracing::debug!(url = %url, "Querying location provider");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let bytes = response.bytes().await?;
        let body: ViaCepBody =
            serde_json::from_slice(&bytes).map_err(|e| ResolveError::Decode(e.to_string()))?;

        // ViaCEP answers `{"erro": true}` (or `"true"`) for unknown codes.
        if body.erro.is_some_and(|v| v.as_bool() == Some(true) || v.as_str() == Some("true")) {
            return Err(ResolveError::NotFound);
        }

        match body.localidade {
            Some(city) if !city.is_empty() => Ok(LocationInfo { city }),
            _ => Err(ResolveError::NotFound),
        }
    }
}

/// WeatherAPI lookup: `GET {base}/v1/current.json?key=..&q={city}`.
#[derive(Clone)]
pub struct WeatherApiResolver {
    client: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct WeatherApiBody {
    current: WeatherApiCurrent,
}

#[derive(Debug, Deserialize)]
struct WeatherApiCurrent {
    temp_c: f64,
}

impl WeatherApiResolver {
    pub fn new(base_url_str: &str, api_key: String, timeout: Duration) -> Result<Self, ResolveError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url(base_url_str)?,
            api_key,
        })
    }
}

impl std::fmt::Debug for WeatherApiResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiResolver")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TemperatureResolver for WeatherApiResolver {
    async fn resolve(&self, city: &str) -> Result<TemperatureSample, ResolveError> {
        let url = self
            .base_url
            .join("v1/current.json")
            .map_err(|e| ResolveError::Config(e.to_string()))?;

        tracing::debug!(url = %url, city = %city, "Querying temperature provider");
        let response = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let bytes = response.bytes().await?;
        let body: WeatherApiBody =
            serde_json::from_slice(&bytes).map_err(|e| ResolveError::Decode(e.to_string()))?;
        Ok(TemperatureSample { celsius: body.current.temp_c })
    }
}

/// Fixed CEP → city table.
#[derive(Debug, Clone, Default)]
pub struct StaticLocationResolver {
    entries: HashMap<String, String>,
}

impl StaticLocationResolver {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }
}

#[async_trait]
impl LocationResolver for StaticLocationResolver {
    async fn resolve(&self, cep: &str) -> Result<LocationInfo, ResolveError> {
        self.entries
            .get(cep)
            .map(|city| LocationInfo { city: city.clone() })
            .ok_or(ResolveError::NotFound)
    }
}

/// Answers every city with the same reading.
#[derive(Debug, Clone, Copy)]
pub struct StaticTemperatureResolver {
    celsius: f64,
}

impl StaticTemperatureResolver {
    pub fn new(celsius: f64) -> Self {
        Self { celsius }
    }
}

#[async_trait]
impl TemperatureResolver for StaticTemperatureResolver {
    async fn resolve(&self, _city: &str) -> Result<TemperatureSample, ResolveError> {
        Ok(TemperatureSample { celsius: self.celsius })
    }
}
