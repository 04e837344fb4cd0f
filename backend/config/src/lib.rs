//! `omnix-config`: runtime configuration for the relay and terminal client.
//!
//! Provides:
//! - Typed config schema
//! - YAML read/write with backup rotation
//! - `${ENV_VAR}` substitution and environment overrides
//! - Default value application
//! - Validation and redaction

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, collect_referenced_vars, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_raw, write_config};
pub use redact::redact;
pub use schema::{
    ChatConfig, ClientConfig, ImageConfig, LoggingConfig, OmnixConfig, ServerConfig, VoiceConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a config file, substitute `${VAR}` references, apply environment
/// overrides and defaults, and log validation findings.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<OmnixConfig> {
    let raw = load_raw(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
    let config: OmnixConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;
    let config = apply_env_overrides(config)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        anyhow::bail!("{} config error(s); first: {}", report.errors.len(), report.errors[0]);
    }

    Ok(config)
}
