//! Tri-state authorization result returned by permission checks.

use std::fmt;

use serde::Serialize;

/// Outcome category of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultKind {
    Success,
    Warning,
    Failure,
}

impl ResultKind {
    /// Chat glyph prefixed to the rendered reason
    pub fn glyph(&self) -> &'static str {
        match self {
            ResultKind::Success => ":ok:",
            ResultKind::Warning => ":warning:",
            ResultKind::Failure => ":x:",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Success => "Success",
            ResultKind::Warning => "Warning",
            ResultKind::Failure => "Failure",
        }
    }
}

/// Immutable result of a permission or authorization check.
///
/// Fields are private and there are no setters; the kind is fixed by the
/// constructor that built the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResult {
    kind: ResultKind,
    reason: String,
}

impl AuthorizationResult {
    pub fn success(reason: impl Into<String>) -> Self {
        Self::new(ResultKind::Success, reason)
    }

    pub fn warning(reason: impl Into<String>) -> Self {
        Self::new(ResultKind::Warning, reason)
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::new(ResultKind::Failure, reason)
    }

    fn new(kind: ResultKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_success(&self) -> bool {
        self.kind == ResultKind::Success
    }

    pub fn is_warning(&self) -> bool {
        self.kind == ResultKind::Warning
    }

    pub fn is_failure(&self) -> bool {
        self.kind == ResultKind::Failure
    }

    /// Whether the dispatcher may proceed (success or warning).
    pub fn permits(&self) -> bool {
        !self.is_failure()
    }

    /// Canonical chat rendering: glyph followed by the reason.
    pub fn render(&self) -> String {
        format!("{} {}", self.kind.glyph(), self.reason)
    }
}

impl fmt::Display for AuthorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.glyph(), self.reason)
    }
}
