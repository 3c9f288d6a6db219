//! Diagnostic Log Sink
//!
//! Renders table-aligned, color-coded console lines and persists failure
//! payloads to one file each. The console is written first so an operator
//! always sees that a failure happened, even if its detail cannot be saved.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crossterm::style::{style, Color, Stylize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::message::{DiagnosticMessage, FailureReport, Severity};
use crate::infrastructure::metrics;
use crate::shared::error::SinkError;

/// Column where the severity tag starts
const SEVERITY_COLUMN: usize = 9;
/// Column where the source label starts
const SOURCE_COLUMN: usize = 20;
/// Column where the message text starts
const TEXT_COLUMN: usize = 32;

const NEUTRAL: Color = Color::Grey;
const ATTENTION: Color = Color::Red;

/// Severity-routed console and failure-report sink.
pub struct DiagnosticSink {
    console: Mutex<Box<dyn Write + Send>>,
    failure_dir: PathBuf,
    colored: bool,
}

impl DiagnosticSink {
    /// Sink writing to stdout, colored when stdout is a terminal
    pub fn stdout(failure_dir: impl Into<PathBuf>) -> Self {
        let colored = std::io::stdout().is_terminal();
        Self::with_writer(std::io::stdout(), failure_dir, colored)
    }

    /// Sink writing to an arbitrary console writer
    pub fn with_writer(
        writer: impl Write + Send + 'static,
        failure_dir: impl Into<PathBuf>,
        colored: bool,
    ) -> Self {
        Self {
            console: Mutex::new(Box::new(writer)),
            failure_dir: failure_dir.into(),
            colored,
        }
    }

    /// Directory failure reports are written to
    pub fn failure_dir(&self) -> &Path {
        &self.failure_dir
    }

    /// Emit a message, returning the path of the failure report if one was written.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` when the failure report cannot be persisted. The
    /// console line has already been written at that point.
    pub async fn emit(&self, message: DiagnosticMessage) -> Result<Option<PathBuf>, SinkError> {
        self.emit_at(Utc::now(), message).await
    }

    /// Emit a message stamped with the given time.
    pub async fn emit_at(
        &self,
        timestamp: DateTime<Utc>,
        message: DiagnosticMessage,
    ) -> Result<Option<PathBuf>, SinkError> {
        let mut console = self.console.lock().await;
        self.emit_locked(&mut **console, timestamp, message).await
    }

    /// Best-effort emit: persistence failures are reduced to a console warning.
    pub async fn log(&self, message: DiagnosticMessage) {
        let mut console = self.console.lock().await;
        if let Err(e) = self.emit_locked(&mut **console, Utc::now(), message).await {
            tracing::warn!(error = %e, "Failure report was not saved");
            self.write_entry(
                &mut **console,
                Utc::now(),
                &DiagnosticMessage::warning("Sink", format!("Failure report could not be saved: {}", e)),
            );
        }
    }

    // The console guard is held until the attention line is out, so a
    // message and its report pointer stay adjacent.
    async fn emit_locked(
        &self,
        console: &mut (dyn Write + Send),
        timestamp: DateTime<Utc>,
        message: DiagnosticMessage,
    ) -> Result<Option<PathBuf>, SinkError> {
        metrics::record_diagnostic(message.severity.as_str());
        self.write_entry(console, timestamp, &message);

        let Some(failure) = message.failure else {
            return Ok(None);
        };

        let path = match self.persist(timestamp, &failure).await {
            Ok(path) => path,
            Err(e) => {
                metrics::record_failure_report(false);
                return Err(e);
            }
        };
        metrics::record_failure_report(true);

        self.write_attention(
            console,
            &format!("^ {} occurred. See {} for details.", failure.kind(), path.display()),
        );

        Ok(Some(path))
    }

    async fn persist(&self, timestamp: DateTime<Utc>, failure: &FailureReport) -> Result<PathBuf, SinkError> {
        tokio::fs::create_dir_all(&self.failure_dir)
            .await
            .map_err(|source| SinkError::Io {
                path: self.failure_dir.clone(),
                source,
            })?;

        let path = self
            .failure_dir
            .join(failure_file_name(timestamp, failure.kind()));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::AlreadyExists {
                    SinkError::Collision(path.clone())
                } else {
                    SinkError::Io {
                        path: path.clone(),
                        source,
                    }
                }
            })?;

        let io_err = |source| SinkError::Io {
            path: path.clone(),
            source,
        };
        file.write_all(failure.to_string().as_bytes())
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        Ok(path)
    }

    fn write_entry(&self, console: &mut (dyn Write + Send), timestamp: DateTime<Utc>, message: &DiagnosticMessage) {
        let line = if self.colored {
            let (time, tag, source) = columns(timestamp, message);
            format!(
                "{}{}{}{}",
                style(time).with(NEUTRAL),
                style(tag).with(message.severity.color()),
                style(source).with(NEUTRAL),
                style(message.text.as_str()).with(NEUTRAL),
            )
        } else {
            render_line(timestamp, message)
        };
        write_line(console, &line);
    }

    fn write_attention(&self, console: &mut (dyn Write + Send), text: &str) {
        let line = if self.colored {
            style(text).with(ATTENTION).to_string()
        } else {
            text.to_string()
        };
        write_line(console, &line);
    }
}

fn write_line(console: &mut (dyn Write + Send), line: &str) {
    let result = writeln!(console, "{}", line).and_then(|_| console.flush());
    if let Err(e) = result {
        tracing::warn!(error = %e, "Console write failed");
    }
}

/// Render a message as a plain, column-aligned console line.
pub fn render_line(timestamp: DateTime<Utc>, message: &DiagnosticMessage) -> String {
    let (time, tag, source) = columns(timestamp, message);
    format!("{}{}{}{}", time, tag, source, message.text)
}

/// File name for a failure report: UTC timestamp to the second plus category.
pub fn failure_file_name(timestamp: DateTime<Utc>, kind: &str) -> String {
    let kind: String = kind
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{} {}.txt", timestamp.format("%d-%m-%Y %H-%M-%S"), kind)
}

fn columns(timestamp: DateTime<Utc>, message: &DiagnosticMessage) -> (String, String, String) {
    (
        pad(&timestamp.format("%H:%M:%S").to_string(), SEVERITY_COLUMN),
        pad(&format!("[{}]", message.severity), SOURCE_COLUMN - SEVERITY_COLUMN),
        pad(&format!("{}:", message.source), TEXT_COLUMN - SOURCE_COLUMN),
    )
}

// A cell wider than its column still gets one separating space.
fn pad(cell: &str, width: usize) -> String {
    if cell.chars().count() < width {
        format!("{:<width$}", cell, width = width)
    } else {
        format!("{} ", cell)
    }
}
