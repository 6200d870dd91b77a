//! Prometheus metrics for bill dispatch.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Recorder behind the `metrics` facade used by the HTTP middleware.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Bills accepted end to end, by selected delivery channel.
pub static BILLS_SENT_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Dispatch attempts by result (`completed`, `upstream_rejected`, `upstream_unavailable`).
pub static DISPATCH_RESULTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Per-channel notification results.
pub static DELIVERIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Aggregation webhook round-trip time.
pub static UPSTREAM_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    });

    BILLS_SENT_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("billing_bills_sent_total", "Total bills sent by delivery channel"),
            &["channel"]
        )
        .expect("Failed to register BILLS_SENT_TOTAL")
    });

    DISPATCH_RESULTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("billing_dispatch_results_total", "Total dispatches by result"),
            &["result"]
        )
        .expect("Failed to register DISPATCH_RESULTS_TOTAL")
    });

    DELIVERIES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_deliveries_total",
                "Customer notifications by channel, provider and status"
            ),
            &["channel", "provider", "status"]
        )
        .expect("Failed to register DELIVERIES_TOTAL")
    });

    UPSTREAM_DURATION.get_or_init(|| {
        register_histogram_vec!(
            histogram_opts!(
                "billing_upstream_duration_seconds",
                "Aggregation webhook request duration",
                vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            ),
            &["endpoint"]
        )
        .expect("Failed to register UPSTREAM_DURATION")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("billing_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });
}

/// HTTP request metrics from the recorder followed by the dispatch metrics,
/// in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return output;
    }
    if let Ok(custom) = String::from_utf8(buffer) {
        output.push_str(&custom);
    }
    output
}

pub fn record_bill_sent(channel: &str) {
    if let Some(counter) = BILLS_SENT_TOTAL.get() {
        counter.with_label_values(&[channel]).inc();
    }
}

pub fn record_dispatch_result(result: &str) {
    if let Some(counter) = DISPATCH_RESULTS_TOTAL.get() {
        counter.with_label_values(&[result]).inc();
    }
}

pub fn record_delivery(channel: &str, provider: &str, success: bool) {
    if let Some(counter) = DELIVERIES_TOTAL.get() {
        let status = if success { "success" } else { "failure" };
        counter.with_label_values(&[channel, provider, status]).inc();
    }
}

pub fn record_upstream_duration(duration_secs: f64) {
    if let Some(histogram) = UPSTREAM_DURATION.get() {
        histogram
            .with_label_values(&["aggregation"])
            .observe(duration_secs);
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
