//! `omnix config`: show the effective config or write a starter file.

use std::path::Path;

use anyhow::{bail, Context, Result};

use omnix_config::{apply_all_defaults, load_and_prepare, redact, write_config, OmnixConfig};

use crate::terminal_output::{dim, note_success};

/// Print the config as loaded at runtime, with secrets masked.
pub async fn show(path: &Path) -> Result<()> {
    let config = load_and_prepare(path).await?;
    println!("{}", dim(&format!("# {}", path.display())));
    print!("{}", render_redacted(&config)?);
    Ok(())
}

fn render_redacted(config: &OmnixConfig) -> Result<String> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    serde_yaml::to_string(&redact(&value)).context("Failed to render config as YAML")
}

/// Write a config filled with defaults. Credentials are left out; they come
/// from `OPENAI_API_KEY`, `ELEVENLABS_API_KEY` and `LOVABLE_API_KEY`.
pub async fn init(path: &Path, force: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(path).await.unwrap_or(false) {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    write_config(&apply_all_defaults(OmnixConfig::default()), path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}
