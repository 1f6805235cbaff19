//! Semantic validation of a loaded configuration.
//!
//! Parsing already rejects malformed files; this pass catches values that are
//! well-formed but would make the bridge fail at startup or misbehave.

use std::path::PathBuf;

use secrecy::ExposeSecret;

use crate::schema::RagbridgeConfig;

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
    /// Dotted path, e.g. "assistant.api_key"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[derive(Default)]
struct Collector(Vec<Diagnostic>);

impl Collector {
    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.push(Severity::Error, path, message);
    }

    fn warning(&mut self, path: &str, message: impl Into<String>) {
        self.push(Severity::Warning, path, message);
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.0.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Validate `config`. `config_path` is only carried through for reporting.
pub fn validate(config: &RagbridgeConfig, config_path: Option<PathBuf>) -> ValidationResult {
    let mut out = Collector::default();
    let assistant = &config.assistant;

    check_secret(&mut out, "assistant.api_key", assistant.api_key.expose_secret());
    check_secret(&mut out, "telegram.token", config.telegram.token.expose_secret());

    if !(assistant.api_url.starts_with("http://") || assistant.api_url.starts_with("https://")) {
        out.error(
            "assistant.api_url",
            format!("'{}' is not an http(s) URL", assistant.api_url),
        );
    }
    if assistant.model.trim().is_empty() {
        out.error("assistant.model", "model must not be empty");
    }

    let has_assistant = assistant
        .assistant_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    let has_store = assistant
        .vector_store_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    if has_assistant != has_store {
        out.error(
            "assistant",
            "assistant_id and vector_store_id must be set together to reuse existing resources",
        );
    }

    if !assistant.has_existing_resources() {
        if assistant.name.trim().is_empty() {
            out.error("assistant.name", "name is required to create an assistant");
        }
        if !assistant.tools.iter().any(|t| t == "file_search") {
            out.warning(
                "assistant.tools",
                "file_search is not enabled; the vector store will not be consulted",
            );
        }
        if !assistant.files_path.is_dir() {
            out.error(
                "assistant.files_path",
                format!(
                    "{} is not a directory; reference files cannot be uploaded",
                    assistant.files_path.display()
                ),
            );
        }
    }

    if config.dispatch.max_concurrent_queries == 0 {
        out.error(
            "dispatch.max_concurrent_queries",
            "must be at least 1, otherwise no query is ever answered",
        );
    }
    if config.telegram.poll_timeout_secs == 0 {
        out.warning(
            "telegram.poll_timeout_secs",
            "0 disables long polling and busy-loops getUpdates",
        );
    }

    if config.replies.error.trim().is_empty() {
        out.error("replies.error", "reply text must not be empty");
    }
    if config.replies.empty.trim().is_empty() {
        out.error("replies.empty", "reply text must not be empty");
    }

    ValidationResult {
        diagnostics: out.0,
        config_path,
    }
}

fn check_secret(out: &mut Collector, path: &str, value: &str) {
    if value.trim().is_empty() {
        out.error(path, "must be set");
    } else if value.starts_with("${") && value.ends_with('}') {
        out.error(
            path,
            format!("environment variable placeholder {value} was not resolved"),
        );
    }
}
