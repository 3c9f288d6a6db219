//! Prometheus Metrics Module
//!
//! Provides process-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Diagnostic messages emitted by severity
//! - Failure reports by persistence outcome
//! - Punishments lifted by the unpunisher
//! - Authorization outcomes by result kind

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Diagnostic message counter - tracks emitted messages by severity
pub static DIAGNOSTICS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("diagnostics_total", "Total number of diagnostic messages emitted")
            .namespace("modbot"),
        &["severity"],
    )
    .expect("Failed to create DIAGNOSTICS_TOTAL metric")
});

/// Failure report counter - tracks persisted and lost failure reports
pub static FAILURE_REPORTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("failure_reports_total", "Total number of failure reports handled")
            .namespace("modbot"),
        &["outcome"], // "saved", "failed"
    )
    .expect("Failed to create FAILURE_REPORTS_TOTAL metric")
});

/// Punishments lifted by the unpunisher loop
pub static PUNISHMENTS_LIFTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("punishments_lifted_total", "Total number of expired punishments lifted")
            .namespace("modbot"),
    )
    .expect("Failed to create PUNISHMENTS_LIFTED_TOTAL metric")
});

/// Authorization outcomes returned to the command dispatcher
pub static AUTHORIZATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("authorizations_total", "Total number of permission checks by outcome")
            .namespace("modbot"),
        &["kind"],
    )
    .expect("Failed to create AUTHORIZATIONS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(DIAGNOSTICS_TOTAL.clone()))
        .expect("Failed to register DIAGNOSTICS_TOTAL");
    registry
        .register(Box::new(FAILURE_REPORTS_TOTAL.clone()))
        .expect("Failed to register FAILURE_REPORTS_TOTAL");
    registry
        .register(Box::new(PUNISHMENTS_LIFTED_TOTAL.clone()))
        .expect("Failed to register PUNISHMENTS_LIFTED_TOTAL");
    registry
        .register(Box::new(AUTHORIZATIONS_TOTAL.clone()))
        .expect("Failed to register AUTHORIZATIONS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record an emitted diagnostic
pub fn record_diagnostic(severity: &str) {
    Lazy::force(&REGISTRY);
    DIAGNOSTICS_TOTAL.with_label_values(&[severity]).inc();
}

/// Helper to record a failure report outcome
pub fn record_failure_report(saved: bool) {
    Lazy::force(&REGISTRY);
    let outcome = if saved { "saved" } else { "failed" };
    FAILURE_REPORTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper to record a lifted punishment
pub fn record_punishment_lifted() {
    Lazy::force(&REGISTRY);
    PUNISHMENTS_LIFTED_TOTAL.inc();
}

/// Helper to record an authorization outcome
pub fn record_authorization(kind: &str) {
    Lazy::force(&REGISTRY);
    AUTHORIZATIONS_TOTAL.with_label_values(&[kind]).inc();
}
