//! Prometheus metrics for the HTTP surface.
//!
//! The registry also carries the core engine metrics (tickets, ledger,
//! messaging side effects).

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "quickeats_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// Total HTTP requests.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quickeats_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently being processed.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quickeats_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Bridge authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickeats_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"], // "not_authenticated", "invalid_credentials", "internal_error"
    )
    .unwrap()
});

// =============================================================================
// Engine outcomes
// =============================================================================

/// Engine operations that returned an error, by error code.
pub static ENGINE_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickeats_engine_rejections_total",
            "Engine operations rejected or failed, by error code",
        ),
        &["code"],
    )
    .unwrap()
});

/// Register all metrics with the registry.
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(ENGINE_REJECTIONS.clone()))
        .unwrap();

    for metric in quickeats_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collapse caller-chosen path segments so labels stay low-cardinality.
///
/// The segment following `tickets` or `chefs` is an id, except for the
/// literal `purge` route.
pub fn normalize_path(path: &str) -> String {
    let mut previous = "";
    path.split('/')
        .map(|segment| {
            let normalized = match previous {
                "tickets" | "chefs" if !segment.is_empty() && segment != "purge" => "{id}",
                _ => segment,
            };
            previous = segment;
            normalized
        })
        .collect::<Vec<_>>()
        .join("/")
}
