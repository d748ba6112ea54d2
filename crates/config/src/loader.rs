use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::MurmurConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["murmur.toml", "murmur.json"];

/// Environment variable overriding `collector.max_messages`.
const MAX_MESSAGES_ENV: &str = "MURMUR_MAX_MESSAGES";

/// Load config from the given path (TOML or JSON).
pub fn load_config(path: &Path) -> Result<MurmurConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./murmur.{toml,json}` (project-local)
/// 2. `~/.config/murmur/murmur.{toml,json}` (user-global)
///
/// Returns `MurmurConfig::default()` if no config file is found or the file
/// cannot be parsed. Env overrides are applied either way.
pub fn discover_and_load() -> MurmurConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                MurmurConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            MurmurConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .chain(
            config_dir()
                .into_iter()
                .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name))),
        )
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/murmur/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "murmur").map(|d| d.config_dir().to_path_buf())
}

/// Parse raw config text, picking the format from the file extension.
pub fn parse_config(raw: &str, path: &Path) -> Result<MurmurConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::unsupported_format(other)),
    }
}

/// Render a config as pretty TOML.
pub fn to_toml_string(config: &MurmurConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// Apply `MURMUR_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut MurmurConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut MurmurConfig, lookup: impl Fn(&str) -> Option<String>) {
    let Some(raw) = lookup(MAX_MESSAGES_ENV) else {
        return;
    };
    match raw.trim().parse::<usize>() {
        Ok(max_messages) => {
            debug!(max_messages, "max_messages overridden from environment");
            config.collector.max_messages = max_messages;
        },
        Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {MAX_MESSAGES_ENV}"),
    }
}
