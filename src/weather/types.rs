//! Wire and domain types shared by both services.

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::weather::units;

/// Inbound payload of `POST /cep` and `POST /weather`.
///
/// `cep` is optional so the back service can tell an absent key apart from an
/// invalid value. Only a JSON object decodes; unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostalCodeRequest {
    pub cep: Option<String>,
}

impl<'de> Deserialize<'de> for PostalCodeRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PostalCodeVisitor)
    }
}

struct PostalCodeVisitor;

impl<'de> Visitor<'de> for PostalCodeVisitor {
    type Value = PostalCodeRequest;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut cep: Option<Option<String>> = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "cep" {
                if cep.is_some() {
                    return Err(de::Error::duplicate_field("cep"));
                }
                cep = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(PostalCodeRequest { cep: cep.flatten() })
    }
}

/// Body sent from the front service to the back service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ForwardedRequest {
    pub cep: String,
}

impl ForwardedRequest {
    pub fn new(cep: impl Into<String>) -> Self {
        Self { cep: cep.into() }
    }
}

/// A resolved city for a postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub city: String,
}

/// A temperature reading in Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSample {
    pub celsius: f64,
}

/// Externally visible weather payload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeatherResult {
    pub city: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub temp_k: f64,
}

impl WeatherResult {
    /// Compose the result for `location` from a Celsius `sample`.
    pub fn from_sample(location: LocationInfo, sample: TemperatureSample) -> Self {
        Self {
            city: location.city,
            temp_c: sample.celsius,
            temp_f: units::fahrenheit(sample.celsius),
            temp_k: units::kelvin(sample.celsius),
        }
    }
}

/// JSON error body returned for every locally produced failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
