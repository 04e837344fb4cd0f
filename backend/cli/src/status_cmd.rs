//! `omnix status`: report a relay's health and configured providers.

use anyhow::Result;
use serde_json::Value;

use omnix_client::RelayClient;

use crate::terminal_output::{note_error, note_success, note_warn};

pub async fn run(relay_url: &str) -> Result<()> {
    let relay = RelayClient::new(relay_url);
    match relay.health().await {
        Ok(report) => {
            note_success(&format!("OMNIX relay is up at {}", relay.base_url()));
            for line in summarize(&report) {
                println!("  {line}");
            }
            for missing in unavailable(&report) {
                note_warn(&format!("{missing} is not configured on the relay"));
            }
        }
        Err(e) => note_error(&format!("OMNIX relay is not reachable at {relay_url}: {e}")),
    }
    Ok(())
}

fn summarize(report: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(version) = report.get("version").and_then(Value::as_str) {
        lines.push(format!("version: {version}"));
    }
    if let Some(uptime) = report.get("uptime_seconds").and_then(Value::as_u64) {
        lines.push(format!("uptime:  {uptime}s"));
    }
    lines
}

const CAPABILITIES: [(&str, &str); 4] = [
    ("chat", "Chat"),
    ("speech", "Text-to-speech"),
    ("transcription", "Speech-to-text"),
    ("images", "Image generation"),
];

fn unavailable(report: &Value) -> Vec<&'static str> {
    CAPABILITIES
        .iter()
        .filter(|(key, _)| report.get(*key).and_then(Value::as_bool) == Some(false))
        .map(|(_, label)| *label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_disabled_capabilities() {
        let report = json!({
            "status": "ok",
            "version": "0.1.0",
            "uptime_seconds": 42,
            "chat": true,
            "speech": false,
            "transcription": true,
            "images": false
        });
        assert_eq!(unavailable(&report), vec!["Text-to-speech", "Image generation"]);
        assert_eq!(summarize(&report), vec!["version: 0.1.0", "uptime:  42s"]);
    }
}
