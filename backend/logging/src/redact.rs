//! Log Redaction Layer
//!
//! Scrubs API keys, access tokens, and phone numbers from strings prior to logging.

use std::sync::LazyLock;

use regex::Regex;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}").unwrap()
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static XI_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"("?xi-api-key"?\s*[:=]\s*"?)[^"\s,}]+"#).unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = TELEPHONE_RE.replace_all(input, "[REDACTED_PHONE]");
    let redacted = API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    XI_KEY_RE
        .replace_all(&redacted, "${1}[REDACTED_TOKEN]")
        .into_owned()
}

/// Redacts and shortens `input` to at most `max_chars` characters.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let redacted = redact_sensitive_data(input);
    if redacted.chars().count() <= max_chars {
        return redacted;
    }
    let mut short: String = redacted.chars().take(max_chars).collect();
    short.push_str("...");
    short
}
