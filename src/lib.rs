//! CEP → weather pipeline.
//!
//! Two services: the front service accepts `POST /cep`, validates the code
//! and forwards it to the back service, which resolves the city and its
//! current temperature in Celsius, Fahrenheit and Kelvin. Every request is
//! traced across both hops.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod weather;

pub use config::{BackConfig, FrontConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Tracer;
pub use weather::WeatherResult;
