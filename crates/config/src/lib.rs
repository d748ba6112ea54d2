//! Configuration loading, env substitution and validation.
//!
//! Config files: `murmur.toml` or `murmur.json`
//! Searched in `./` then `~/.config/murmur/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, load_config, parse_config,
        to_toml_string,
    },
    schema::{CollectorConfig, FilterConfig, MentionMode, MurmurConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
