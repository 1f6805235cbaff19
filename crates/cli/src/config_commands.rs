use std::path::{Path, PathBuf};

use anyhow::Result;

use ragbridge_config::{RagbridgeConfig, Severity, ValidationResult, discover_and_load, load_config};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load the config from `explicit`, or discover it when no path was given.
pub fn load(explicit: Option<&Path>) -> Result<(RagbridgeConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => Ok((load_config(path)?, Some(path.to_path_buf()))),
        None => Ok(discover_and_load()?),
    }
}

/// Which config sections a command depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Everything: the full bridge.
    All,
    /// Only the assistant backend.
    Assistant,
}

impl Scope {
    fn covers(self, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Assistant => path.starts_with("assistant"),
        }
    }
}

/// Number of error diagnostics relevant to `scope`.
pub fn blocking_errors(result: &ValidationResult, scope: Scope) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error && scope.covers(&d.path))
        .count()
}

/// Print diagnostics to stderr and fail if any error falls within `scope`.
pub fn ensure_valid(result: &ValidationResult, scope: Scope) -> Result<()> {
    print_diagnostics(result);
    let errors = blocking_errors(result, scope);
    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s); run `ragbridge check` for details");
    }
    Ok(())
}

fn print_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };
        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
    }
}

/// `ragbridge check`: report every diagnostic, exit non-zero on errors.
pub fn check(result: &ValidationResult) -> Result<()> {
    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    print_diagnostics(result);
    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        ragbridge_config::{Diagnostic, validate},
    };

    fn diag(severity: Severity, path: &str) -> Diagnostic {
        Diagnostic {
            severity,
            path: path.into(),
            message: "x".into(),
        }
    }

    #[test]
    fn assistant_scope_ignores_telegram_errors() {
        let result = ValidationResult {
            diagnostics: vec![
                diag(Severity::Error, "telegram.token"),
                diag(Severity::Warning, "assistant.tools"),
            ],
            config_path: None,
        };
        assert_eq!(blocking_errors(&result, Scope::Assistant), 0);
        assert_eq!(blocking_errors(&result, Scope::All), 1);
        assert!(ensure_valid(&result, Scope::Assistant).is_ok());
        assert!(ensure_valid(&result, Scope::All).is_err());
    }

    #[test]
    fn explicit_path_is_loaded_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragbridge.toml");
        std::fs::write(
            &path,
            "[assistant]\napi_key = \"sk-test\"\nassistant_id = \"asst_1\"\nvector_store_id = \"vs_1\"\n\n[telegram]\ntoken = \"123:abc\"\n",
        )
        .unwrap();

        let (config, found) = load(Some(&path)).unwrap();
        assert_eq!(found.as_deref(), Some(path.as_path()));
        assert_eq!(config.assistant.assistant_id.as_deref(), Some("asst_1"));

        let result = validate(&config, found);
        assert_eq!(blocking_errors(&result, Scope::All), 0, "{:?}", result.diagnostics);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
