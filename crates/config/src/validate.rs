//! Semantic validation of a loaded [`MurmurConfig`].

use crate::schema::MurmurConfig;

/// Lock timeouts below this are almost certainly a unit mistake.
const MIN_SENSIBLE_LOCK_TIMEOUT_MS: u64 = 100;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "collector.max_messages"
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Check a config for values the collector cannot work with.
pub fn validate(config: &MurmurConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.collector.max_messages == 0 {
        result.push(
            Severity::Error,
            "collector.max_messages",
            "must be at least 1, a zero-capacity buffer can never dispatch",
        );
    }

    let timeout = config.collector.lock_timeout_ms;
    if timeout > 0 && timeout < MIN_SENSIBLE_LOCK_TIMEOUT_MS {
        result.push(
            Severity::Warning,
            "collector.lock_timeout_ms",
            format!("{timeout}ms is shorter than a typical subscriber run"),
        );
    }

    for (path, patterns) in [
        ("filters.group_allowlist", &config.filters.group_allowlist),
        ("filters.sender_allowlist", &config.filters.sender_allowlist),
    ] {
        if patterns.iter().any(|p| p.trim().is_empty()) {
            result.push(Severity::Warning, path, "contains an empty pattern");
        }
    }

    result
}
