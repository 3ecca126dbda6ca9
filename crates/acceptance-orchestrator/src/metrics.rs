use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::LazyLock;

pub static CONFIRMATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "acceptance_confirmations_total",
        "PSP confirmations by outcome",
        &["result"]
    )
    .unwrap()
});

pub static CONFIRMATION_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "acceptance_confirmation_duration_seconds",
        "Confirmation processing latency in seconds",
        &["result"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap()
});

pub static INTENTS_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "acceptance_intents_created_total",
        "Payment intents created"
    )
    .unwrap()
});

/// Record one processed confirmation under `result`.
pub fn record_confirmation(result: &str, elapsed_secs: f64) {
    CONFIRMATIONS.with_label_values(&[result]).inc();
    CONFIRMATION_LATENCY
        .with_label_values(&[result])
        .observe(elapsed_secs);
}

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
