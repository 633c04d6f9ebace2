//! Error responses.
//!
//! # Responsibilities
//! - Map every terminal failure to a status code
//! - Render `{"message": ...}` bodies for locally produced errors
//! - Relay application errors from the back service verbatim

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::weather::types::ErrorBody;

/// Failures surfaced to an HTTP caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not a JSON object of the expected shape.
    #[error("invalid request body")]
    Format(String),

    /// `cep` key absent from the payload.
    #[error("cep is required")]
    MissingCep,

    /// `cep` present but not eight digits.
    #[error("invalid zipcode")]
    Validation,

    /// No location for a valid code.
    #[error("can not find zipcode")]
    NotFound,

    #[error("error fetching temperature")]
    TemperatureUnavailable,

    /// Non-200 answer from the back service.
    #[error("weather service answered {status}")]
    UpstreamRejected {
        status: StatusCode,
        body: Bytes,
        content_type: Option<HeaderValue>,
    },

    #[error("weather service unavailable")]
    UpstreamUnreachable,

    /// A 200 from the back service that does not decode.
    #[error("invalid response from weather service")]
    Encoding,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Format(_) | ApiError::MissingCep => StatusCode::BAD_REQUEST,
            ApiError::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::TemperatureUnavailable | ApiError::UpstreamUnreachable => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamRejected { status, .. } => *status,
            ApiError::Encoding => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { status, body, content_type } => {
                ApiError::UpstreamRejected { status, body, content_type }
            }
            GatewayError::Unreachable { .. } | GatewayError::Request(_) => ApiError::UpstreamUnreachable,
            GatewayError::BadResponse(_) => ApiError::Encoding,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::UpstreamRejected { body, content_type, .. } => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = status;
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
                }
                response
            }
            other => (status, Json(ErrorBody::new(other.to_string()))).into_response(),
        }
    }
}
