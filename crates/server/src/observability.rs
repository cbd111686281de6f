use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("bank_logins_total", "Login attempts by outcome", &["outcome"])
        .expect("register logins_total")
});

pub static SESSIONS_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bank_sessions_rejected_total",
        "Requests refused for a missing, invalid or idle session"
    )
    .expect("register sessions_rejected_total")
});

pub static LEDGER_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("bank_ledger_operations_total", "Completed account operations", &["action"])
        .expect("register ledger_operations_total")
});

pub static STORAGE_UNAVAILABLE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bank_storage_unavailable_total",
        "Responses failed because the store was unreachable or too slow"
    )
    .expect("register storage_unavailable_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
