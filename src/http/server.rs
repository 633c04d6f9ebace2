//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for either service
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Bind server to listener and stop on the shutdown broadcast

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{BackConfig, FrontConfig};
use crate::gateway::{GatewayClient, GatewayError};
use crate::http::back::{weather_handler, BackState};
use crate::http::front::{cep_handler, FrontState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::trace::Tracer;
use crate::weather::resolver::{location_resolver, temperature_resolver, ResolveError};

/// Router for the front service: `POST /cep`, `GET /health`.
pub fn front_router(state: FrontState, request_secs: u64) -> Router {
    let router = Router::new()
        .route("/cep", post(cep_handler))
        .route("/health", get(health_handler))
        .with_state(state);
    with_middleware(router, request_secs)
}

/// Router for the back service: `POST /weather`, `GET /health`.
pub fn back_router(state: BackState, request_secs: u64) -> Router {
    let router = Router::new()
        .route("/weather", post(weather_handler))
        .route("/health", get(health_handler))
        .with_state(state);
    with_middleware(router, request_secs)
}

/// Outermost first: request ID, trace, response request ID, timeout.
#[allow(deprecated)]
fn with_middleware(router: Router, request_secs: u64) -> Router {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// One of the two services, ready to serve.
pub struct HttpServer {
    router: Router,
    name: &'static str,
}

impl HttpServer {
    /// Front service wired to the back service named in `config`.
    pub fn front(config: &FrontConfig, tracer: Tracer) -> Result<Self, GatewayError> {
        let gateway = GatewayClient::new(config, tracer.clone())?;
        tracing::info!(upstream = %gateway.endpoint(), "Weather service endpoint configured");
        let state = FrontState { tracer, gateway };
        Ok(Self {
            router: front_router(state, config.timeouts.request_secs),
            name: "front",
        })
    }

    /// Back service with the providers named in `config`.
    pub fn back(config: &BackConfig, tracer: Tracer) -> Result<Self, ResolveError> {
        let resolver_timeout = Duration::from_millis(config.timeouts.resolver_ms);
        let state = BackState {
            tracer,
            location: location_resolver(&config.resolvers.location, resolver_timeout)?,
            temperature: temperature_resolver(&config.resolvers.temperature, resolver_timeout)?,
            resolver_timeout,
            propagate_context: config.telemetry.propagate_context,
        };
        tracing::debug!(resolvers = ?config.resolvers, "Resolvers configured");
        Ok(Self {
            router: back_router(state, config.timeouts.request_secs),
            name: "back",
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, service = self.name, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(service = self.name, "HTTP server stopped");
        Ok(())
    }
}
