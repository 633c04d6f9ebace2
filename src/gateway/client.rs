//! HTTP client for the back service.
//!
//! # Responsibilities
//! - Serialize the forwarded request and POST it to `/weather`
//! - Retry transport failures (refused, reset, per-attempt timeout)
//! - Classify the response into `WeatherResult` or `GatewayError`
//! - Wrap the whole exchange in one client span
//!
//! # Design Decisions
//! - A received response is final, whatever its status
//! - The span ends after the last attempt, so its duration covers retries

use std::error::Error as StdError;
use std::time::Duration;

use opentelemetry::Context;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode, Uri};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::FrontConfig;
use crate::gateway::error::GatewayError;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::observability::propagation::inject_context;
use crate::observability::trace::{SpanGuard, SpanKind, Tracer};
use crate::resilience::retries::RetryPolicy;
use crate::resilience::timeouts::with_timeout;
use crate::weather::types::{ForwardedRequest, WeatherResult};

/// Largest response body accepted from the back service.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Client for `POST {weather_service_url}/weather`.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    propagate_context: bool,
    tracer: Tracer,
}

impl GatewayClient {
    pub fn new(config: &FrontConfig, tracer: Tracer) -> Result<Self, GatewayError> {
        let endpoint = weather_endpoint(&config.upstream.weather_service_url)?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(config.timeouts.upstream_attempt_ms)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            endpoint,
            policy: RetryPolicy::from(&config.retries),
            attempt_timeout: Duration::from_millis(config.timeouts.upstream_attempt_ms),
            propagate_context: config.telemetry.propagate_context,
            tracer,
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Deliver `request` to the back service and decode its answer.
    pub async fn forward(
        &self,
        parent: &Context,
        request: &ForwardedRequest,
        request_id: Option<&str>,
    ) -> Result<WeatherResult, GatewayError> {
        let mut span = self.tracer.start_span(parent, "POST /weather", SpanKind::Client);
        span.set_attribute("http.method", "POST");
        span.set_attribute("http.url", self.endpoint.to_string());

        let result = self.deliver(&mut span, request, request_id).await;
        if let Err(e) = &result {
            span.set_error(e.to_string());
        }
        span.end();
        result
    }

    async fn deliver(
        &self,
        span: &mut SpanGuard,
        request: &ForwardedRequest,
        request_id: Option<&str>,
    ) -> Result<WeatherResult, GatewayError> {
        let body = Bytes::from(serde_json::to_vec(request).map_err(|e| GatewayError::Request(e.to_string()))?);
        let context = span.context();

        let mut attempts = 0;
        let mut last_error = String::new();

        for attempt in self.policy.schedule() {
            if !attempt.delay_before.is_zero() {
                tracing::info!(
                    request_id = request_id.unwrap_or("unknown"),
                    attempt = attempt.number,
                    delay = ?attempt.delay_before,
                    "Retrying weather service request"
                );
                tokio::time::sleep(attempt.delay_before).await;
            }
            attempts = attempt.number;

            let outbound = self.build_request(body.clone(), &context, request_id)?;
            match with_timeout(self.attempt_timeout, self.client.request(outbound)).await {
                Ok(Ok(response)) => {
                    metrics::record_upstream_attempt("response");
                    span.set_attribute("retry.attempts", i64::from(attempts));
                    span.set_attribute("http.status_code", i64::from(response.status().as_u16()));
                    return read_response(response).await;
                }
                Ok(Err(e)) => {
                    metrics::record_upstream_attempt("transport_error");
                    last_error = error_chain(&e);
                }
                Err(e) => {
                    metrics::record_upstream_attempt("timeout");
                    last_error = e.to_string();
                }
            }

            tracing::warn!(
                request_id = request_id.unwrap_or("unknown"),
                attempt = attempts,
                max_attempts = self.policy.max_attempts(),
                error = %last_error,
                "Weather service delivery failed"
            );
        }

        span.set_attribute("retry.attempts", i64::from(attempts));
        Err(GatewayError::Unreachable { attempts, last_error })
    }

    fn build_request(
        &self,
        body: Bytes,
        context: &Context,
        request_id: Option<&str>,
    ) -> Result<Request<Body>, GatewayError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(id) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            builder = builder.header(X_REQUEST_ID, id);
        }

        let mut request = builder
            .body(Body::from(body))
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        if self.propagate_context {
            inject_context(context, request.headers_mut());
        }
        Ok(request)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("endpoint", &self.endpoint)
            .field("policy", &self.policy)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

async fn read_response(response: Response<Incoming>) -> Result<WeatherResult, GatewayError> {
    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
        .await
        .map_err(|e| GatewayError::BadResponse(format!("failed to read body: {e}")))?;

    if status != StatusCode::OK {
        return Err(GatewayError::Rejected { status, body, content_type });
    }

    serde_json::from_slice(&body).map_err(|e| GatewayError::BadResponse(e.to_string()))
}

fn weather_endpoint(base: &str) -> Result<Uri, GatewayError> {
    format!("{}/weather", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| GatewayError::Request(format!("{base}: {e}")))
}

/// Flatten an error and its sources; hyper's top-level messages are terse.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
