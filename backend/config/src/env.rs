//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` references in string values are substituted. Only
//!   uppercase `[A-Z_][A-Z0-9_]*` names match, and `$${VAR}` is kept as a
//!   literal `${VAR}`.
//! - Well-known variables (`OPENAI_API_KEY`, `OMNIX_PORT`, ...) override the
//!   file's values.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{ChatConfig, ClientConfig, ImageConfig, LoggingConfig, OmnixConfig, ServerConfig, VoiceConfig};

/// Optional leading `$` (the escape), then `${NAME}`.
static ENV_REF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references from `env`. Unset or empty variables are an error.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_REF_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(v) => v.clone(),
            None => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// All variable names referenced in a value tree, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.extend(
                ENV_REF_PATTERN
                    .captures_iter(s)
                    .filter(|caps| caps[1].is_empty())
                    .map(|caps| caps[2].to_string()),
            ),
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    let mut vars = Vec::new();
    walk(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: OmnixConfig) -> Result<OmnixConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from `env`. Empty values are ignored.
pub fn apply_env_overrides_with(
    mut config: OmnixConfig,
    env: &HashMap<String, String>,
) -> Result<OmnixConfig> {
    let get = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

    if let Some(key) = get("OPENAI_API_KEY") {
        config.chat.get_or_insert_with(ChatConfig::default).api_key = Some(key);
    }
    if let Some(key) = get("ELEVENLABS_API_KEY") {
        config.voice.get_or_insert_with(VoiceConfig::default).api_key = Some(key);
    }
    if let Some(key) = get("LOVABLE_API_KEY") {
        config.image.get_or_insert_with(ImageConfig::default).api_key = Some(key);
    }
    if let Some(bind) = get("OMNIX_BIND") {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind);
    }
    if let Some(port) = get("OMNIX_PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("OMNIX_PORT is not a valid port: {port}"))?;
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(url) = get("OMNIX_RELAY_URL") {
        config.client.get_or_insert_with(ClientConfig::default).relay_url = Some(url);
    }
    if let Some(token) = get("OMNIX_ACCESS_TOKEN") {
        config.client.get_or_insert_with(ClientConfig::default).access_token = Some(token);
    }
    if let Some(level) = get("RUST_LOG") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"chat": {"apiKey": "${OPENAI_API_KEY}"}});
        let result = resolve_env_vars_with(&v, &env(&[("OPENAI_API_KEY", "sk-abc123")])).unwrap();
        assert_eq!(result["chat"]["apiKey"], "sk-abc123");
    }

    #[test]
    fn error_names_missing_var_and_path() {
        let v = json!({"image": {"apiKey": "${MISSING_VAR}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_VAR"));
        assert!(err.contains("image.apiKey"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"note": "use $${OPENAI_API_KEY} in prompts", "plain": "no vars"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["note"], "use ${OPENAI_API_KEY} in prompts");
        assert_eq!(result["plain"], "no vars");
    }

    #[test]
    fn collects_only_unescaped_vars() {
        let v = json!({"a": "${FOO}", "b": ["${BAR}", "$${BAZ}"]});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR", "FOO"]);
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = OmnixConfig {
            chat: Some(ChatConfig {
                api_key: Some("from-file".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_env_overrides_with(
            cfg,
            &env(&[("OPENAI_API_KEY", "from-env"), ("OMNIX_PORT", "9100"), ("ELEVENLABS_API_KEY", "")]),
        )
        .unwrap();
        assert_eq!(cfg.chat_api_key(), Some("from-env"));
        assert_eq!(cfg.server.unwrap().port, Some(9100));
        assert!(cfg.voice.is_none());
    }

    #[test]
    fn invalid_port_override_is_error() {
        let result = apply_env_overrides_with(OmnixConfig::default(), &env(&[("OMNIX_PORT", "http")]));
        assert!(result.is_err());
    }
}
