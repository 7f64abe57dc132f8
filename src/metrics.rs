//! Prometheus metrics for datasvc

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Latency buckets in seconds (the usual client-library defaults)
const LATENCY_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Process-wide request metrics
pub struct Metrics {
    pub registry: Registry,

    /// Requests by method, endpoint and final status
    pub request_count: IntCounterVec,

    /// Request latency by method and endpoint
    pub request_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let request_count = IntCounterVec::new(
            Opts::new("python_request_count", "App Request Count"),
            &["method", "endpoint", "status"],
        )?;

        let request_latency = HistogramVec::new(
            HistogramOpts::new(
                "python_request_latency_seconds",
                "Request latency in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["method", "endpoint"],
        )?;

        registry.register(Box::new(request_count.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            request_count,
            request_latency,
        })
    }

    /// Record one finished request
    pub fn observe_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        self.request_latency
            .with_label_values(&[method, endpoint])
            .observe(elapsed.as_secs_f64());
        let status = status.to_string();
        self.request_count
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
    }

    /// Get Prometheus formatted metrics
    pub fn gather(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_request("GET", "/health", 200, Duration::from_millis(3));

        let output = metrics.gather().unwrap();
        assert!(output.contains(
            r#"python_request_count{endpoint="/health",method="GET",status="200"} 1"#
        ));
        assert!(output.contains("python_request_latency_seconds_bucket"));
        assert!(output.contains(r#"le="0.005""#));
    }

    #[test]
    fn test_counts_split_by_status() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_request("POST", "/api/data", 201, Duration::ZERO);
        metrics.observe_request("POST", "/api/data", 201, Duration::ZERO);
        metrics.observe_request("POST", "/api/data", 400, Duration::ZERO);

        assert_eq!(
            metrics
                .request_count
                .with_label_values(&["POST", "/api/data", "201"])
                .get(),
            2
        );
        assert_eq!(
            metrics
                .request_count
                .with_label_values(&["POST", "/api/data", "400"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .request_latency
                .with_label_values(&["POST", "/api/data"])
                .get_sample_count(),
            3
        );
    }

    #[test]
    fn test_independent_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.observe_request("GET", "/", 200, Duration::ZERO);
        assert!(!b.gather().unwrap().contains(r#"endpoint="/""#));
    }
}
