use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Context, Error, Result},
    env_subst::substitute_env,
    schema::RagbridgeConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "ragbridge.toml",
    "ragbridge.yaml",
    "ragbridge.yml",
    "ragbridge.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RagbridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./ragbridge.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/ragbridge/ragbridge.{toml,yaml,yml,json}` (user-global)
///
/// Returns the loaded config and the path it came from, or
/// `RagbridgeConfig::default()` when no file exists. A file that exists but
/// fails to parse is an error: running with defaults would silently drop the
/// credentials it holds.
pub fn discover_and_load() -> Result<(RagbridgeConfig, Option<PathBuf>)> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let cfg = load_config(&path)?;
            Ok((cfg, Some(path)))
        },
        None => {
            warn!("no config file found, using defaults");
            Ok((RagbridgeConfig::default(), None))
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/ragbridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ragbridge").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<RagbridgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
