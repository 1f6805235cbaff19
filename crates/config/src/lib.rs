//! Configuration loading, env substitution, and validation.
//!
//! Config files: `ragbridge.toml`, `ragbridge.yaml`, `ragbridge.yml`, or
//! `ragbridge.json`. Searched in `./` then `~/.config/ragbridge/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file text.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{AssistantConfig, DispatchConfig, RagbridgeConfig, RepliesConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
