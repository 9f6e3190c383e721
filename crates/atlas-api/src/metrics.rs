//! Prometheus metrics, exposed on `/metrics` when enabled.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

static REGISTRY: OnceLock<Registry> = OnceLock::new();
static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

fn register_collector<T>(collector: T) -> T
where
    T: prometheus::core::Collector + Clone + 'static,
{
    let _ = registry().register(Box::new(collector.clone()));
    collector
}

fn http_requests_total() -> &'static IntCounterVec {
    HTTP_REQUESTS_TOTAL.get_or_init(|| {
        register_collector(
            IntCounterVec::new(
                Opts::new("atlas_http_requests_total", "HTTP request count."),
                &["route", "method", "status"],
            )
            .expect("create atlas_http_requests_total"),
        )
    })
}

fn http_request_duration_seconds() -> &'static HistogramVec {
    HTTP_REQUEST_DURATION_SECONDS.get_or_init(|| {
        register_collector(
            HistogramVec::new(
                HistogramOpts::new(
                    "atlas_http_request_duration_seconds",
                    "HTTP request duration in seconds.",
                )
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
                &["route", "method"],
            )
            .expect("create atlas_http_request_duration_seconds"),
        )
    })
}

/// Request-observing middleware; mounted only when metrics are enabled.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    http_requests_total()
        .with_label_values(&[&route, &method, response.status().as_str()])
        .inc();
    http_request_duration_seconds()
        .with_label_values(&[&route, &method])
        .observe(started.elapsed().as_secs_f64());

    response
}

/// Render the registry in the Prometheus text exposition format.
pub fn render() -> Result<(Vec<u8>, String), prometheus::Error> {
    let _ = http_requests_total();
    let _ = http_request_duration_seconds();

    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok((buffer, encoder.format_type().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_text_format() {
        http_requests_total()
            .with_label_values(&["/health", "GET", "200"])
            .inc();
        let (buffer, content_type) = render().unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("atlas_http_requests_total"));
        assert!(content_type.starts_with("text/plain"));
    }
}
