//! Markdown rendering for the working ingredient list and step progress.

use std::collections::{BTreeMap, BTreeSet};

/// Condensed command help appended to status replies.
pub const COMMANDS_CONDENSED: &str = "Commands: i=ingredients  |  s=steps  |  x=item/steps done  |  \
     k=next step  |  what=status  |  clear=restart  |  pick=choose recipe";

fn strike(text: &str) -> String {
    format!("~~{text}~~")
}

/// Display text for one ingredient, before strike markup.
pub fn ingredient_display(ingredient: &str, subs: &BTreeMap<String, String>) -> String {
    match subs.get(ingredient) {
        Some(sub) => format!("{sub} (instead of {ingredient})"),
        None => ingredient.to_string(),
    }
}

/// One bullet per ingredient in recipe order. Strikes are keyed by the original
/// ingredient, even when a substitute is shown.
pub fn render_ingredients(
    ingredients: &[String],
    subs: &BTreeMap<String, String>,
    strikes: &BTreeSet<String>,
) -> Vec<String> {
    ingredients
        .iter()
        .map(|ing| {
            let display = ingredient_display(ing, subs);
            if strikes.contains(ing) {
                format!("- {}", strike(&display))
            } else {
                format!("- {display}")
            }
        })
        .collect()
}

/// `"{n}. {text}"` per step; the first `current_step` entries are struck through.
pub fn render_steps(steps: &[String], current_step: usize) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            if i < current_step {
                format!("{}. {}", i + 1, strike(step))
            } else {
                format!("{}. {}", i + 1, step)
            }
        })
        .collect()
}
