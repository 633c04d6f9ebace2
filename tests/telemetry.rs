//! Span export against a fake Zipkin collector.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cep_weather::config::TelemetryConfig;
use cep_weather::observability::{SpanKind, Tracer};
use serde_json::Value;

mod common;

use common::MockResponse;

type Batches = Arc<Mutex<Vec<Vec<Value>>>>;

/// Collector that accepts every POST after `delay` and keeps each JSON array.
async fn start_collector(delay: Duration) -> (String, Batches) {
    let batches: Batches = Arc::new(Mutex::new(Vec::new()));
    let recorder = batches.clone();
    let addr = common::start_programmable_backend(move |req| {
        let recorder = recorder.clone();
        async move {
            tokio::time::sleep(delay).await;
            if req.method == "POST" && req.target == "/api/v2/spans" {
                if let Ok(Value::Array(spans)) = serde_json::from_str(&req.body) {
                    recorder.lock().unwrap().push(spans);
                }
            }
            MockResponse::text(202, "")
        }
    })
    .await;
    (format!("http://{addr}/api/v2/spans"), batches)
}

fn telemetry(endpoint: &str) -> TelemetryConfig {
    TelemetryConfig {
        enabled: true,
        zipkin_endpoint: endpoint.to_string(),
        // Long enough that only size or shutdown triggers an export.
        flush_interval_ms: 60_000,
        export_timeout_ms: 2_000,
        ..TelemetryConfig::default()
    }
}

fn received(batches: &Batches) -> Vec<Value> {
    batches.lock().unwrap().iter().flatten().cloned().collect()
}

fn emit_request(tracer: &Tracer) {
    let root = tracer.start_root("POST /weather", SpanKind::Server, None);
    tracer.start_span(&root.context(), "resolve location", SpanKind::Internal).end();
    tracer.start_span(&root.context(), "resolve temperature", SpanKind::Internal).end();
    root.end();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_flushes_pending_spans() {
    let (endpoint, batches) = start_collector(Duration::ZERO).await;
    let tracer = Tracer::zipkin("weather-service", &telemetry(&endpoint)).unwrap();

    emit_request(&tracer);
    assert!(received(&batches).is_empty(), "exported before flush");
    tracer.shutdown(Duration::from_secs(5)).await;

    assert_eq!(batches.lock().unwrap().len(), 1);
    let spans = received(&batches);
    assert_eq!(spans.len() as u64, tracer.spans_started());

    let mut names: Vec<_> = spans.iter().map(|s| s["name"].as_str().unwrap().to_string()).collect();
    names.sort();
    assert_eq!(names, ["POST /weather", "resolve location", "resolve temperature"]);
    assert!(spans.iter().all(|s| s["localEndpoint"]["serviceName"] == "weather-service"));

    let root = spans.iter().find(|s| s["name"] == "POST /weather").unwrap();
    assert_eq!(root["kind"], "SERVER");
    assert!(root.get("parentId").is_none());
    for child in spans.iter().filter(|s| s["name"] != "POST /weather") {
        assert_eq!(child["traceId"], root["traceId"]);
        assert_eq!(child["parentId"], root["id"]);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_interval_flushes_without_shutdown() {
    let (endpoint, batches) = start_collector(Duration::ZERO).await;
    let mut config = telemetry(&endpoint);
    config.flush_interval_ms = 50;
    let tracer = Tracer::zipkin("cep-service", &config).unwrap();

    tracer.start_root("POST /cep", SpanKind::Server, None).end();

    let deadline = Instant::now() + Duration::from_secs(5);
    while received(&batches).is_empty() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let spans = received(&batches);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["name"], "POST /cep");
    assert_eq!(spans[0]["localEndpoint"]["serviceName"], "cep-service");

    tracer.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exports_respect_batch_size() {
    let (endpoint, batches) = start_collector(Duration::ZERO).await;
    let mut config = telemetry(&endpoint);
    config.batch_size = 2;
    let tracer = Tracer::zipkin("weather-service", &config).unwrap();

    emit_request(&tracer);
    tracer.shutdown(Duration::from_secs(5)).await;

    let batches = batches.lock().unwrap();
    assert!(batches.len() >= 2, "three spans fit one request: {batches:?}");
    assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= 2));
    assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stalled_collector_caps_queued_spans() {
    let (endpoint, batches) = start_collector(Duration::from_millis(300)).await;
    let mut config = telemetry(&endpoint);
    config.batch_size = 1;
    config.max_queue_size = 1;
    config.flush_interval_ms = 10;
    let tracer = Tracer::zipkin("weather-service", &config).unwrap();

    for _ in 0..50 {
        tracer.start_root("POST /weather", SpanKind::Server, None).end();
    }
    tracer.shutdown(Duration::from_secs(10)).await;

    let delivered = received(&batches).len();
    assert_eq!(tracer.spans_started(), 50);
    assert!(delivered >= 1, "nothing reached the collector");
    assert!(delivered < 50, "queue held every span while the collector stalled");
}
