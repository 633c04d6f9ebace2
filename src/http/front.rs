//! `POST /cep`: validate the code and relay it to the weather service.
//!
//! # States
//! ```text
//! Received → Validated → Forwarded → Responded
//!     ↘ Rejected (400 malformed body, 422 invalid zipcode)
//! ```

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use opentelemetry::Context;

use crate::gateway::GatewayClient;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::observability::trace::{SpanKind, Tracer};
use crate::weather::cep;
use crate::weather::types::{ForwardedRequest, PostalCodeRequest, WeatherResult};

/// Application state injected into front handlers.
#[derive(Clone, Debug)]
pub struct FrontState {
    pub tracer: Tracer,
    pub gateway: GatewayClient,
}

pub async fn cep_handler(State(state): State<FrontState>, headers: HeaderMap, body: Bytes) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);

    let mut span = state.tracer.start_root("POST /cep", SpanKind::Server, None);
    span.set_attribute("http.method", "POST");
    span.set_attribute("http.route", "/cep");
    if let Some(id) = &request_id {
        span.set_attribute("request.id", id.clone());
    }

    tracing::debug!(request_id = request_id.as_deref().unwrap_or("unknown"), "Handling CEP request");

    let response = match handle(&state, &span.context(), &body, request_id.as_deref()).await {
        Ok(weather) => (StatusCode::OK, Json(weather)).into_response(),
        Err(e) => {
            tracing::warn!(
                request_id = request_id.as_deref().unwrap_or("unknown"),
                status = e.status().as_u16(),
                error = %e,
                "CEP request failed"
            );
            span.set_error(e.to_string());
            e.into_response()
        }
    };

    let status = response.status().as_u16();
    span.set_attribute("http.status_code", i64::from(status));
    span.end();
    metrics::record_request("front", "/cep", status, start_time);
    response
}

async fn handle(
    state: &FrontState,
    root: &Context,
    body: &[u8],
    request_id: Option<&str>,
) -> Result<WeatherResult, ApiError> {
    let request: PostalCodeRequest = serde_json::from_slice(body).map_err(|e| ApiError::Format(e.to_string()))?;

    let code = {
        let mut span = state.tracer.start_span(root, "validate cep", SpanKind::Internal);
        // A missing key is just another invalid code at this hop.
        let code = request.cep.unwrap_or_default();
        if !cep::validate(&code) {
            span.set_error("invalid zipcode");
            return Err(ApiError::Validation);
        }
        code
    };

    let mut span = state.tracer.start_span(root, "forward to weather service", SpanKind::Internal);
    span.set_attribute("cep", code.clone());
    let result = state
        .gateway
        .forward(&span.context(), &ForwardedRequest::new(code), request_id)
        .await;
    if let Err(e) = &result {
        span.set_error(e.to_string());
    }
    span.end();

    result.map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrontConfig;
    use crate::http::server::front_router;
    use axum::body::Body;
    use axum::http::Request;
    use opentelemetry::Value;
    use opentelemetry_sdk::trace::InMemorySpanExporter;
    use tower::ServiceExt;

    fn state() -> (FrontState, InMemorySpanExporter) {
        let mut config = FrontConfig::default();
        // Nothing listens on port 9; any forward would fail.
        config.upstream.weather_service_url = "http://127.0.0.1:9".into();
        config.retries.base_delay_ms = 1;
        config.retries.max_delay_ms = 1;
        let exporter = InMemorySpanExporter::default();
        let tracer = Tracer::with_exporter("front-test", exporter.clone());
        let gateway = GatewayClient::new(&config, tracer.clone()).unwrap();
        (FrontState { tracer, gateway }, exporter)
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::post("/cep")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn short_code_is_rejected_before_forwarding() {
        let (state, exporter) = state();
        let tracer = state.tracer.clone();
        let response = front_router(state, 30).oneshot(post(r#"{"cep":"123"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json(response).await, serde_json::json!({"message": "invalid zipcode"}));

        let names: Vec<_> = exporter.get_finished_spans().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["validate cep", "POST /cep"]);
        assert_eq!(tracer.spans_started(), 2);
    }

    #[tokio::test]
    async fn missing_code_is_invalid_zipcode() {
        let (state, _exporter) = state();
        let response = front_router(state, 30).oneshot(post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (state, exporter) = state();
        let response = front_router(state, 30).oneshot(post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await, serde_json::json!({"message": "invalid request body"}));
        assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn array_body_is_bad_request() {
        let (state, exporter) = state();
        let response = front_router(state, 30).oneshot(post(r#"["29902555"]"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await, serde_json::json!({"message": "invalid request body"}));
        let names: Vec<_> = exporter.get_finished_spans().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["POST /cep"]);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_internal_error() {
        let (state, exporter) = state();
        let tracer = state.tracer.clone();
        let response = front_router(state, 30).oneshot(post(r#"{"cep":"29902555"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await, serde_json::json!({"message": "weather service unavailable"}));

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len() as u64, tracer.spans_started());
        let client = spans.iter().find(|s| s.name == "POST /weather").unwrap();
        let attempts = client.attributes.iter().find(|kv| kv.key.as_str() == "retry.attempts");
        assert_eq!(attempts.map(|kv| &kv.value), Some(&Value::I64(3)));
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let (state, _exporter) = state();
        let response = front_router(state, 30)
            .oneshot(Request::get("/cep").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
