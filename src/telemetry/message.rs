//! Diagnostic message and failure payload types.

use std::fmt;

use crossterm::style::Color;
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Verbose,
        Severity::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Verbose => "Verbose",
            Severity::Debug => "Debug",
        }
    }

    /// Console color for the severity tag
    pub fn color(&self) -> Color {
        match self {
            Severity::Critical => Color::DarkRed,
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Info => Color::Green,
            Severity::Verbose => Color::Cyan,
            Severity::Debug => Color::Magenta,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail of a failure attached to a diagnostic message.
///
/// The `Display` output is the full report written to disk: the category and
/// top-level message, then one line per underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    kind: String,
    message: String,
    trace: Vec<String>,
}

impl FailureReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Build a report from an error, using its type name as the category
    /// and its `source()` chain as the trace.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::categorized(short_type_name::<E>(), err)
    }

    /// Build a report from an error with an explicit category name.
    pub fn categorized(kind: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut trace = Vec::new();
        let mut cause = err.source();
        while let Some(inner) = cause {
            trace.push(inner.to_string());
            cause = inner.source();
        }

        Self {
            kind: kind.into(),
            message: err.to_string(),
            trace,
        }
    }

    pub fn with_trace(mut self, line: impl Into<String>) -> Self {
        self.trace.push(line.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for cause in &self.trace {
            write!(f, "\n   ---> {}", cause)?;
        }
        Ok(())
    }
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A severity-tagged message routed through the diagnostic sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub source: String,
    pub text: String,
    pub failure: Option<FailureReport>,
}

impl DiagnosticMessage {
    pub fn new(severity: Severity, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity,
            source: source.into(),
            text: text.into(),
            failure: None,
        }
    }

    pub fn debug(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Severity::Debug, source, text)
    }

    pub fn verbose(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Severity::Verbose, source, text)
    }

    pub fn info(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Severity::Info, source, text)
    }

    pub fn warning(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, source, text)
    }

    pub fn error(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Severity::Error, source, text)
    }

    pub fn critical(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Severity::Critical, source, text)
    }

    /// Attach a failure payload
    pub fn with_failure(mut self, failure: FailureReport) -> Self {
        self.failure = Some(failure);
        self
    }
}
