//! Downstream gateway: the hop from the front service to the back service.
//!
//! # Data Flow
//! ```text
//! ForwardedRequest
//!     → client.rs (serialize, POST /weather, retry transport failures)
//!     → 200: WeatherResult
//!     → other status: GatewayError::Rejected (relayed verbatim)
//!     → no response after all attempts: GatewayError::Unreachable
//! ```

pub mod client;
pub mod error;

pub use client::GatewayClient;
pub use error::GatewayError;
