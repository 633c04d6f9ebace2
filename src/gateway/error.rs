//! Gateway error classification.

use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode};
use thiserror::Error;

/// Outcome of a failed hop-2 call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The back service answered with a non-200 status.
    #[error("weather service answered {status}")]
    Rejected {
        status: StatusCode,
        body: Bytes,
        content_type: Option<HeaderValue>,
    },

    /// No response was received within the retry budget.
    #[error("weather service unreachable after {attempts} attempt(s): {last_error}")]
    Unreachable { attempts: u32, last_error: String },

    /// A 200 response whose body is not a `WeatherResult`.
    #[error("invalid response from weather service: {0}")]
    BadResponse(String),

    /// The outbound request could not be built.
    #[error("failed to build weather service request: {0}")]
    Request(String),
}

impl GatewayError {
    /// Status code the caller of the front service should see.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Rejected { status, .. } => *status,
            GatewayError::Unreachable { .. } | GatewayError::Request(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BadResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
