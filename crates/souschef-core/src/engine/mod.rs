//! Command engine: deterministic text commands over a [`CookingState`].
//!
//! Input is trimmed and lower-cased, then offered to each rule of [`RULES`] in
//! order. The first rule that claims the input produces the result and all later
//! rules are skipped. Order resolves ambiguity: `x 3` is a step range before it
//! could ever be read as "strike the ingredient named 3".
//!
//! The engine is a pure function of its arguments. It never touches session
//! storage or the LLM; state changes are expressed only through the returned
//! [`Dispatch`].

mod rules;
mod vocab;

use crate::recipe::{Recipe, RecipeLibrary};
use crate::state::CookingState;

/// Result of offering one user message to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Resolved locally. `new_state` is `None` when nothing changed.
    /// `advance_step` is set when the command moved progress forward by one.
    Handled {
        reply: String,
        new_state: Option<CookingState>,
        advance_step: bool,
    },
    /// Discard the current state (and possibly recipe) and resume from the top
    /// with `new_state`. Produced by full resets and recipe picks.
    Restart { reply: String, new_state: CookingState },
    /// Not a command; the caller should ask the fallback with the original input.
    Unhandled,
}

impl Dispatch {
    pub(crate) fn reply(reply: impl Into<String>) -> Self {
        Self::Handled {
            reply: reply.into(),
            new_state: None,
            advance_step: false,
        }
    }

    pub(crate) fn update(reply: impl Into<String>, new_state: CookingState) -> Self {
        Self::Handled {
            reply: reply.into(),
            new_state: Some(new_state),
            advance_step: false,
        }
    }

    pub fn handled(&self) -> bool {
        !matches!(self, Self::Unhandled)
    }

    /// Reply text; empty for [`Dispatch::Unhandled`].
    pub fn reply_text(&self) -> &str {
        match self {
            Self::Handled { reply, .. } | Self::Restart { reply, .. } => reply,
            Self::Unhandled => "",
        }
    }

    pub fn new_state(&self) -> Option<&CookingState> {
        match self {
            Self::Handled { new_state, .. } => new_state.as_ref(),
            Self::Restart { new_state, .. } => Some(new_state),
            Self::Unhandled => None,
        }
    }

    pub fn advance_step(&self) -> bool {
        matches!(self, Self::Handled { advance_step: true, .. })
    }

    pub fn is_restart(&self) -> bool {
        matches!(self, Self::Restart { .. })
    }
}

/// Everything a rule may look at for one message.
pub(crate) struct Turn<'a> {
    /// Trimmed input with original casing, for echoing free text.
    pub raw: &'a str,
    /// Trimmed, lower-cased input used for matching.
    pub lower: String,
    pub state: &'a CookingState,
    pub recipe: &'a Recipe,
    pub library: &'a RecipeLibrary,
}

/// A named entry of the priority table. A rule claims the input by returning `Some`.
pub(crate) struct Rule {
    pub name: &'static str,
    pub apply: fn(&Turn<'_>) -> Option<Dispatch>,
}

/// Priority order. Changing it changes which command wins for ambiguous input.
pub(crate) const RULES: [Rule; 13] = [
    Rule { name: "cancel_search", apply: rules::cancel_search },
    Rule { name: "full_reset", apply: rules::full_reset },
    Rule { name: "mark_steps_done", apply: rules::mark_steps_done },
    Rule { name: "enter_pick_mode", apply: rules::enter_pick_mode },
    Rule { name: "pick_search", apply: rules::pick_search },
    Rule { name: "pick_select", apply: rules::pick_select },
    Rule { name: "show_step", apply: rules::show_step },
    Rule { name: "strike_ingredient", apply: rules::strike_ingredient },
    Rule { name: "substitute", apply: rules::substitute },
    Rule { name: "list_ingredients", apply: rules::list_ingredients },
    Rule { name: "list_steps", apply: rules::list_steps },
    Rule { name: "status", apply: rules::status },
    Rule { name: "advance", apply: rules::advance },
];

/// Names of the rules in the order they are tried.
pub fn rule_order() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|r| r.name)
}

/// Offers `user_input` to the command rules for `recipe`, the recipe `state` is bound to.
/// `library` is consulted only by pick mode.
pub fn dispatch(
    user_input: &str,
    state: &CookingState,
    recipe: &Recipe,
    library: &RecipeLibrary,
) -> Dispatch {
    let raw = user_input.trim();
    let turn = Turn {
        raw,
        lower: raw.to_lowercase(),
        state,
        recipe,
        library,
    };
    for rule in RULES.iter() {
        if let Some(result) = (rule.apply)(&turn) {
            tracing::debug!(
                target: "souschef::engine",
                rule = rule.name,
                recipe = %recipe.key,
                "Command handled"
            );
            return result;
        }
    }
    tracing::debug!(target: "souschef::engine", recipe = %recipe.key, "No command matched");
    Dispatch::Unhandled
}
