//! Weather domain subsystem.
//!
//! # Data Flow
//! ```text
//! PostalCodeRequest { cep }
//!     → cep.rs (8-digit format gate)
//!     → resolver.rs (cep → city, city → celsius)
//!     → units.rs (celsius → fahrenheit, kelvin)
//!     → WeatherResult { city, temp_c, temp_f, temp_k }
//! ```

pub mod cep;
pub mod resolver;
pub mod types;
pub mod units;

pub use resolver::{LocationResolver, ResolveError, TemperatureResolver};
pub use types::{ErrorBody, ForwardedRequest, LocationInfo, PostalCodeRequest, TemperatureSample, WeatherResult};
