//! Fixed command vocabulary. Matching is substring/prefix/regex based, never semantic.

use once_cell::sync::Lazy;
use regex::Regex;

pub(super) const CANCEL_WORDS: [&str; 3] = ["cancel", "exit", "stop picking"];

/// Exact-or-substring triggers for a full reset.
pub(super) const RESET_PHRASES: [&str; 6] = [
    "start over",
    "restart",
    "start again",
    "reset recipe",
    "start this recipe over",
    "clear",
];

/// Checked in order; the first prefix that matches wins.
pub(super) const STRIKE_PREFIXES: [&str; 6] = ["strikethrough ", "strike ", "cross off ", "x ", "cross ", "86 "];
pub(super) const UNSTRIKE_PREFIXES: [&str; 3] = ["unstrike ", "uncross ", "restore "];

pub(super) const INGREDIENT_PHRASES: [&str; 6] = [
    "ingredients",
    "ingredient list",
    "what are the ingredients",
    "show ingredients",
    "list the ingredients",
    "what do i need",
];

pub(super) const STEP_PHRASES: [&str; 5] = [
    "show all steps",
    "steps",
    "list steps",
    "show steps",
    "what are the steps",
];

/// Compared after punctuation is stripped.
pub(super) const CONFIRM_WORDS: [&str; 7] = ["k", "ok", "okay", "next", "next step", "done", "finished"];

/// Search results shown per pick-mode query.
pub(super) const PICK_DISPLAY_LIMIT: usize = 25;

pub(super) static MARK_STEPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^x\s+([0-9]+)\s*$").expect("Invalid regex pattern"));

pub(super) static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("Invalid regex pattern"));

/// One substitution per `,` / `;` / `.` delimited clause.
pub(super) static SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bsub(?:stitute)?\s+(.+?)\s+for\s+(.+)$").expect("Invalid regex pattern")
});

pub(super) static CLAUSE_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;.]").expect("Invalid regex pattern"));

/// Parses a run of ASCII digits; values past `usize::MAX` saturate.
pub(super) fn parse_count(digits: &str) -> usize {
    digits.parse::<usize>().unwrap_or(usize::MAX)
}

/// Lower-cased, punctuation stripped, whitespace collapsed.
pub(super) fn bare_words(lower: &str) -> String {
    let kept: String = lower
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
