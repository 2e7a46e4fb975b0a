//! Seam for free-form input the command engine does not handle.

use std::collections::BTreeMap;

/// Phrases that count as "I finished this step" when the model cannot decide.
const ADVANCE_TRIGGERS: [&str; 10] = [
    "done",
    "finished",
    "next",
    "next step",
    "whats next",
    "what is next",
    "ok",
    "okay",
    "k",
    "kk",
];

/// Context handed to the fallback for one unhandled message.
#[derive(Debug, Clone)]
pub struct FallbackRequest<'a> {
    pub user_input: &'a str,
    pub recipe_name: &'a str,
    pub recipe_description: &'a str,
    pub steps: &'a [String],
    pub ingredients: &'a [String],
    pub substitutions: &'a BTreeMap<String, String>,
    /// 0-based index of the next step to work on.
    pub current_step: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReply {
    /// Never empty.
    pub reply: String,
    pub advance_step: bool,
}

/// Produces a reply for input the engine declined. Implementations must not fail:
/// transport or parse problems degrade to [`naive_advance`] with some reply text.
#[async_trait::async_trait]
pub trait FallbackAdapter: Send + Sync {
    async fn respond(&self, request: &FallbackRequest<'_>) -> FallbackReply;
}

/// Heuristic advance decision: alphanumerics only, then any of [`ADVANCE_TRIGGERS`]
/// appearing as whole words.
pub fn naive_advance(user_input: &str) -> bool {
    let clean: String = user_input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let padded = format!(" {} ", clean.split_whitespace().collect::<Vec<_>>().join(" "));
    ADVANCE_TRIGGERS
        .iter()
        .any(|t| padded.contains(&format!(" {t} ")))
}
