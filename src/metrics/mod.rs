//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Attempt outcomes
//! - Broadcasts and receipt polls
//! - Suppressed receipt lookup errors
//! - Confirmation latency

use crate::error::{VoterError, VoterResult};

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref ATTEMPTS: CounterVec = register_counter_vec!(
        "voter_attempts_total",
        "Vote attempts by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref TX_SUBMITTED: Counter = register_counter!(
        "voter_transactions_submitted_total",
        "Vote transactions accepted by the RPC endpoint"
    ).unwrap();

    pub static ref RECEIPT_POLLS: Counter = register_counter!(
        "voter_receipt_polls_total",
        "Receipt lookups issued while awaiting confirmation"
    ).unwrap();

    pub static ref SUPPRESSED_POLL_ERRORS: Counter = register_counter!(
        "voter_suppressed_poll_errors_total",
        "Receipt lookups that failed and were treated as still pending"
    ).unwrap();

    pub static ref CONFIRMATION_LATENCY: Histogram = register_histogram!(
        "voter_confirmation_latency_seconds",
        "Time from broadcast to confirmed receipt",
        vec![5.0, 15.0, 30.0, 60.0, 90.0, 120.0, 180.0, 240.0, 300.0]
    ).unwrap();

    pub static ref LAST_NONCE: Gauge = register_gauge!(
        "voter_last_submitted_nonce",
        "Nonce of the most recently broadcast vote"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> VoterResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| VoterError::Config(format!("Cannot bind metrics port {}: {}", self.port, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| VoterError::Config(format!("Metrics server failed: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    render().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Current metrics in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// Helper functions to record metrics

pub fn record_attempt(outcome: &str) {
    ATTEMPTS.with_label_values(&[outcome]).inc();
}

pub fn record_tx_submitted() {
    TX_SUBMITTED.inc();
}

pub fn record_receipt_poll() {
    RECEIPT_POLLS.inc();
}

pub fn record_suppressed_poll_error() {
    SUPPRESSED_POLL_ERRORS.inc();
}

pub fn record_confirmation_latency(latency_secs: f64) {
    CONFIRMATION_LATENCY.observe(latency_secs);
}

pub fn record_nonce(nonce: u64) {
    LAST_NONCE.set(nonce as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_metrics_are_rendered() {
        record_attempt("confirmed");
        record_suppressed_poll_error();
        record_nonce(42);

        let text = render().unwrap();
        assert!(text.contains("voter_attempts_total{outcome=\"confirmed\"}"));
        assert!(text.contains("voter_suppressed_poll_errors_total"));
        assert!(text.contains("voter_last_submitted_nonce"));
    }
}
