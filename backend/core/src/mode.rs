//! Mode tags and the instruction preamble each one prepends to a conversation.
//!
//! Lookup is pure: the same tag always yields the same preamble text.

use std::collections::HashMap;

/// Persona shared by every mode.
pub const BASE_PERSONA: &str = "You are OMNIX, a multi-domain AI assistant. \
Answer clearly, using headings, bullet points and line breaks where they help. \
Reply in the language the user writes in. If you are unsure, say so.";

/// Instruction used when no mode is selected or the tag is unknown.
pub const DEFAULT_INSTRUCTION: &str = "Act as a general-purpose assistant. \
Match the level of detail the user asks for and suggest useful next steps at the end.";

const MODE_INSTRUCTIONS: &[(&str, &str)] = &[
    ("code", "Focus on programming: write correct, idiomatic code, explain bugs and their fixes, and point out best practices."),
    ("research", "Provide in-depth, well-structured analysis. Separate established facts from open questions."),
    ("creative", "Write imaginative content such as stories and poems. Favor vivid language and original ideas."),
    ("business", "Advise on strategy and operations. Quantify trade-offs and call out risks and expected return."),
    ("explain-simple", "Explain the topic in plain words a beginner can follow. Use short sentences and everyday analogies."),
    ("explain-deep", "Give a detailed technical explanation, covering mechanisms, edge cases and terminology."),
    ("translate", "Translate the user's text faithfully. Ask for the target language if it is not given."),
    ("summarize", "Condense the input into its key points. Keep the summary short and faithful to the source."),
    ("calculator", "Solve the calculation or equation step by step and state the final result clearly."),
    ("tutor", "Teach the subject step by step, check understanding, and offer short exercises."),
    ("consultant", "Act as an expert consultant: diagnose the situation and give concrete recommendations."),
    ("assistant", "Act as a general-purpose assistant for everyday tasks."),
];

/// Maps mode tags to instruction preambles, with optional per-tag overrides.
#[derive(Debug, Clone, Default)]
pub struct ModePreambles {
    overrides: HashMap<String, String>,
}

impl ModePreambles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the instruction of specific tags (or add new tags).
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Full system preamble for `mode`. Unset or unknown tags use the default.
    pub fn preamble(&self, mode: Option<&str>) -> String {
        let instruction = mode
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .and_then(|tag| self.instruction(tag))
            .unwrap_or(DEFAULT_INSTRUCTION);
        format!("{BASE_PERSONA}\n\n{instruction}")
    }

    /// Instruction registered for `tag`, if the tag is known.
    pub fn instruction(&self, tag: &str) -> Option<&str> {
        self.overrides.get(tag).map(String::as_str).or_else(|| {
            MODE_INSTRUCTIONS
                .iter()
                .find(|(name, _)| *name == tag)
                .map(|(_, text)| *text)
        })
    }

    pub fn is_known(&self, tag: &str) -> bool {
        self.instruction(tag).is_some()
    }
}

/// Built-in mode tags, in catalogue order.
pub fn builtin_modes() -> impl Iterator<Item = &'static str> {
    MODE_INSTRUCTIONS.iter().map(|(name, _)| *name)
}

/// Greeting shown when a mode is selected, e.g. "OMNIX Explain-simple mode activated. ...".
/// Only the first character is capitalised.
pub fn welcome_message(mode: &str) -> String {
    let mut chars = mode.chars();
    let title = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("OMNIX {title} mode activated. How can I assist you today?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_mode_yields_identical_preamble() {
        let preambles = ModePreambles::new();
        let first = preambles.preamble(Some("code"));
        let second = preambles.preamble(Some("code"));
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert!(first.starts_with(BASE_PERSONA));
        assert!(first.contains("programming"));
    }

    #[test]
    fn unknown_and_missing_modes_use_default() {
        let preambles = ModePreambles::new();
        let default = preambles.preamble(None);
        assert!(default.ends_with(DEFAULT_INSTRUCTION));
        assert_eq!(preambles.preamble(Some("no-such-mode")), default);
        assert_eq!(preambles.preamble(Some("  ")), default);
    }

    #[test]
    fn overrides_take_precedence() {
        let mut overrides = HashMap::new();
        overrides.insert("code".to_string(), "Only answer in Rust.".to_string());
        overrides.insert("poet".to_string(), "Answer in verse.".to_string());
        let preambles = ModePreambles::with_overrides(overrides);
        assert!(preambles.preamble(Some("code")).ends_with("Only answer in Rust."));
        assert!(preambles.is_known("poet"));
        assert!(preambles.preamble(Some("tutor")).contains("step by step"));
    }

    #[test]
    fn catalogue_lists_every_builtin_mode() {
        let modes: Vec<_> = builtin_modes().collect();
        assert_eq!(modes.len(), 12);
        assert!(modes.contains(&"explain-deep"));
    }

    #[test]
    fn welcome_message_capitalises_only_the_first_letter() {
        assert_eq!(
            welcome_message("explain-simple"),
            "OMNIX Explain-simple mode activated. How can I assist you today?"
        );
        assert_eq!(
            welcome_message("code"),
            "OMNIX Code mode activated. How can I assist you today?"
        );
    }
}
