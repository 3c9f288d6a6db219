//! Telemetry and Observability
//!
//! Two channels run side by side:
//! - `tracing` events for developer-level structured logs on stderr
//! - the [`DiagnosticSink`] operator console on stdout, which also persists
//!   failure reports to disk

mod message;
mod sink;

pub use message::{DiagnosticMessage, FailureReport, Severity};
pub use sink::{failure_file_name, render_line, DiagnosticSink};

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Environment variable selecting the stderr log format (`json` or `pretty`)
pub const LOG_FORMAT_ENV: &str = "MODBOT_LOG_FORMAT";

/// Initialize tracing subscriber
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,modbot=debug"));

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let (pretty_layer, json_layer) = if json {
        let layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false);
        (None, Some(layer))
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty_layer)
        .with(json_layer)
        .init();

    tracing::info!(json, "Tracing initialized");
}
