//! W3C trace-context propagation over HTTP headers.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;

pub const TRACEPARENT: &str = "traceparent";

pub struct HeadersInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeadersInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(&value)) {
            self.0.insert(name, value);
        }
    }
}

pub struct HeadersExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeadersExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Remote parent carried by `headers`, if a valid `traceparent` is present.
pub fn extract_context(headers: &HeaderMap) -> Option<Context> {
    let cx = TraceContextPropagator::new().extract(&HeadersExtractor(headers));
    let valid = cx.span().span_context().is_valid();
    valid.then_some(cx)
}

/// Write the span carried by `cx` into `headers`.
pub fn inject_context(cx: &Context, headers: &mut HeaderMap) {
    TraceContextPropagator::new().inject_context(cx, &mut HeadersInjector(headers));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(traceparent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, traceparent.parse().unwrap());
        headers
    }

    #[test]
    fn rejects_malformed_traceparent() {
        assert!(extract_context(&HeaderMap::new()).is_none());
        assert!(extract_context(&headers("garbage")).is_none());
        assert!(extract_context(&headers("00-00000000000000000000000000000000-00f067aa0ba902b7-01")).is_none());
    }

    #[test]
    fn extracted_context_is_remote() {
        let cx = extract_context(&headers("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")).unwrap();
        let span = cx.span();
        assert!(span.span_context().is_remote());
        assert!(span.span_context().is_sampled());
    }

    #[test]
    fn empty_context_injects_nothing() {
        let mut headers = HeaderMap::new();
        inject_context(&Context::new(), &mut headers);
        assert!(headers.get(TRACEPARENT).is_none());
    }
}
