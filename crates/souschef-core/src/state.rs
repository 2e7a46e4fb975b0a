//! Per-session cooking state threaded through every command.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Progress through one recipe.
///
/// `current_step` is the index of the next step to work on and lives in
/// `[0, step_count]`; `step_count` means the recipe is complete. Substitution and
/// strike keys are always the recipe's own ingredient strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CookingState {
    pub recipe_key: String,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub ingredient_subs: BTreeMap<String, String>,
    #[serde(default)]
    pub ingredient_strikes: BTreeSet<String>,
    #[serde(default)]
    pub pending_recipe_pick: bool,
    /// Keys of the most recently displayed search results, in display order.
    /// `None` until a search has shown something to pick from.
    #[serde(default)]
    pub pick_candidates: Option<Vec<String>>,
}

impl CookingState {
    /// Fresh state bound to `recipe_key`.
    pub fn new(recipe_key: impl Into<String>) -> Self {
        Self {
            recipe_key: recipe_key.into(),
            ..Self::default()
        }
    }

    /// Full reinitialization, keeping only the recipe binding.
    pub fn reset(&self) -> Self {
        Self::new(self.recipe_key.clone())
    }

    #[inline]
    pub fn is_complete(&self, step_count: usize) -> bool {
        self.current_step >= step_count
    }

    /// Moves to the next step unless already complete. Returns whether it moved.
    pub fn advance(&mut self, step_count: usize) -> bool {
        if self.current_step < step_count {
            self.current_step += 1;
            true
        } else {
            false
        }
    }

    /// Sets progress so that steps `1..=n` are done, clamped to the recipe length.
    pub fn mark_done_through(&mut self, n: usize, step_count: usize) -> usize {
        self.current_step = n.min(step_count);
        self.current_step
    }

    pub fn clear_pick_mode(&mut self) {
        self.pending_recipe_pick = false;
        self.pick_candidates = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_stops_at_step_count() {
        let mut state = CookingState::new("garlic_pasta");
        assert!(state.advance(2));
        assert!(state.advance(2));
        assert!(!state.advance(2));
        assert_eq!(state.current_step, 2);
        assert!(state.is_complete(2));
    }

    #[test]
    fn reset_keeps_only_recipe_key() {
        let mut state = CookingState::new("garlic_pasta");
        state.current_step = 3;
        state.ingredient_strikes.insert("Salt".into());
        state.ingredient_subs.insert("Salt".into(), "Miso".into());
        state.pending_recipe_pick = true;
        state.pick_candidates = Some(vec!["x".into()]);
        assert_eq!(state.reset(), CookingState::new("garlic_pasta"));
    }

    #[test]
    fn mark_done_through_clamps() {
        let mut state = CookingState::new("r");
        assert_eq!(state.mark_done_through(999, 7), 7);
        assert_eq!(state.mark_done_through(0, 7), 0);
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let state: CookingState = serde_json::from_str(r#"{"recipe_key":"k"}"#).unwrap();
        assert_eq!(state, CookingState::new("k"));
    }
}
