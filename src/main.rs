//! # Moderation Bot
//!
//! Application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading from `./config/`
//! - The moderation subsystems and the transport connection

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use modbot::config::ConfigStore;
use modbot::infrastructure::transport::LoopbackTransport;
use modbot::startup::Application;
use modbot::telemetry::{DiagnosticMessage, DiagnosticSink, FailureReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Overrides such as MODBOT__TOKEN or RUST_LOG may come from .env
    dotenvy::dotenv().ok();

    modbot::telemetry::init_tracing();

    info!("Starting moderation bot...");

    let store = ConfigStore::in_working_dir();
    let transport = Arc::new(LoopbackTransport::default());

    let mut application =
        match Application::build(store, transport, |core| DiagnosticSink::stdout(&core.failure_log_dir))
            .await
        {
            Ok(application) => application,
            Err(e) => {
                // The core configuration may be unreadable, so fall back to the default directory
                let sink = DiagnosticSink::stdout("logs");
                sink.log(
                    DiagnosticMessage::critical("Startup", "Startup failed")
                        .with_failure(FailureReport::categorized(e.kind(), &e)),
                )
                .await;
                return Err(e.into());
            }
        };

    if let Err(e) = application.start().await {
        application
            .sink()
            .log(
                DiagnosticMessage::critical("Startup", "Failed to connect")
                    .with_failure(FailureReport::categorized(e.kind(), &e)),
            )
            .await;
        application.stop().await;
        return Err(e.into());
    }

    info!("Moderation bot running, press Ctrl+C to stop");
    application
        .run_until_stopped(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;

    Ok(())
}
