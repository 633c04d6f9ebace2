//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cep_weather::config::{BackConfig, FrontConfig, LocationProviderConfig, TemperatureProviderConfig};
use cep_weather::http::HttpServer;
use cep_weather::lifecycle::Shutdown;
use cep_weather::observability::Tracer;
use opentelemetry::Value;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What a mock backend saw.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Canned reply from a mock backend.
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: "application/json", body: body.into() }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: "text/plain", body: body.into() }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Read one HTTP/1.1 request, headers and `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(MockRequest { method, target, headers, body })
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let response = f(request).await;
                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.status,
                            reason(response.status),
                            response.content_type,
                            response.body.len(),
                            response.body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Accept connections and drop them unanswered, counting each one.
pub async fn start_dropping_listener(accepted: Arc<AtomicU32>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    addr
}

/// A running service and the spans it produced.
pub struct Running {
    pub addr: SocketAddr,
    pub tracer: Tracer,
    pub spans: InMemorySpanExporter,
    pub shutdown: Shutdown,
}

impl Running {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Spans that have ended, in the order they ended.
    pub fn finished(&self) -> Vec<SpanData> {
        self.spans.get_finished_spans().unwrap()
    }

    pub fn span(&self, name: &str) -> SpanData {
        self.finished()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no span named {name:?}"))
    }
}

pub fn attribute(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes.iter().find(|kv| kv.key.as_str() == key).map(|kv| kv.value.clone())
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Back service with a fixed CEP table and a fixed temperature.
pub fn static_back_config(entries: &[(&str, &str)], celsius: f64) -> BackConfig {
    let mut config = BackConfig::default();
    config.resolvers.location = LocationProviderConfig::Static {
        entries: entries
            .iter()
            .map(|(cep, city)| (cep.to_string(), city.to_string()))
            .collect::<BTreeMap<_, _>>(),
    };
    config.resolvers.temperature = TemperatureProviderConfig::Static { celsius };
    config.telemetry.enabled = false;
    config
}

/// Front service pointed at `weather_service_url`, with fast retries.
pub fn front_config(weather_service_url: &str) -> FrontConfig {
    let mut config = FrontConfig::default();
    config.upstream.weather_service_url = weather_service_url.to_string();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config.timeouts.upstream_attempt_ms = 500;
    config.telemetry.enabled = false;
    config
}

async fn spawn(server: HttpServer, tracer: Tracer, spans: InMemorySpanExporter) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Running { addr, tracer, spans, shutdown }
}

pub async fn spawn_back(config: &BackConfig) -> Running {
    let spans = InMemorySpanExporter::default();
    let tracer = Tracer::with_exporter(config.service_name(), spans.clone());
    let server = HttpServer::back(config, tracer.clone()).unwrap();
    spawn(server, tracer, spans).await
}

pub async fn spawn_front(config: &FrontConfig) -> Running {
    let spans = InMemorySpanExporter::default();
    let tracer = Tracer::with_exporter(config.service_name(), spans.clone());
    let server = HttpServer::front(config, tracer.clone()).unwrap();
    spawn(server, tracer, spans).await
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
