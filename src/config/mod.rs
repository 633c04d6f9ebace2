//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → FrontConfig / BackConfig (validated, immutable)
//!     → shared by value into handler state
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, ConfigError};
pub use schema::{
    BackConfig, FrontConfig, ListenerConfig, LocationProviderConfig, LogFormat, ObservabilityConfig,
    ResolverConfig, RetryConfig, TelemetryConfig, TemperatureProviderConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{Validate, ValidationError};
