//! Sous chef agent: answers free-form cooking questions through the [`ModelRouter`]
//! and decides whether the user finished the current step.

use crate::model_router::ModelRouter;
use souschef_core::{naive_advance, FallbackAdapter, FallbackReply, FallbackRequest};

pub const SYSTEM_INSTRUCTIONS: &str = r#"You are Agent Sous Chef, a friendly, concise AI cooking assistant.
You help users cook step by step with clarity and calm encouragement.

You must always respond as a strict JSON object with two keys:
- "reply": a short natural-language message to the user
- "advance_step": a boolean (true or false) indicating whether the app should move to the next step

Format example:
{
  "reply": "Some helpful message to the user.",
  "advance_step": false
}

Rules:
- Speak clearly and briefly.
- Focus on the current step unless it is clearly completed.
- If the user says things like "done", "finished", or clearly describes completing the current step, set "advance_step" to true.
- If the user asks "what is next" or similar, and the current step seems complete, set "advance_step" to true.
- If the user is asking for ingredient substitutions, suggest 1-3 simple alternatives and set "advance_step": false.
- If you are at the final step, and it is complete, use "advance_step": false and wrap up the recipe politely.
- Do not add any extra keys to the JSON.
- Do not include backticks or explanations outside the JSON.
"#;

const EMPTY_REPLY: &str = "I had trouble generating a reply. Please tell me again what you did.";
const UNAVAILABLE_REPLY: &str =
    "Sorry, I couldn't reach the kitchen assistant just now. Say 'next' when you're ready to move on, or ask again in a moment.";

pub struct SousChefAgent {
    router: ModelRouter,
}

impl SousChefAgent {
    pub fn new(router: ModelRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }
}

#[async_trait::async_trait]
impl FallbackAdapter for SousChefAgent {
    async fn respond(&self, request: &FallbackRequest<'_>) -> FallbackReply {
        let context = build_context(request);
        match self.router.complete(SYSTEM_INSTRUCTIONS, &context).await {
            Ok(raw) => parse_completion(&raw, request.user_input),
            Err(e) => {
                tracing::warn!(
                    target: "souschef::llm",
                    error = %e,
                    recipe = %request.recipe_name,
                    "LLM call failed; falling back to heuristic advance"
                );
                FallbackReply {
                    reply: UNAVAILABLE_REPLY.to_string(),
                    advance_step: naive_advance(request.user_input),
                }
            }
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text context block for one message. The step index is clamped into the recipe.
pub fn build_context(request: &FallbackRequest<'_>) -> String {
    let steps = request.steps;
    let (index, current_text, steps_text, completed, remaining) = if steps.is_empty() {
        (0, "No steps defined.".to_string(), "None".to_string(), "None".to_string(), "None".to_string())
    } else {
        let index = request.current_step.min(steps.len() - 1);
        let numbered = steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");
        (
            index,
            steps[index].clone(),
            numbered,
            bullet_list(&steps[..index]),
            bullet_list(&steps[index + 1..]),
        )
    };

    let ingredients = if request.ingredients.is_empty() {
        "None".to_string()
    } else {
        request
            .ingredients
            .iter()
            .map(|ing| match request.substitutions.get(ing) {
                Some(sub) => format!("- {ing} (substitute: {sub})"),
                None => format!("- {ing}"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "User message: {user}\n\n\
         Active recipe: {name}\n\
         Recipe description: {description}\n\n\
         Ingredients:\n{ingredients}\n\n\
         All steps:\n{steps_text}\n\n\
         Current step index (1-based): {position}\n\
         Current step text: {current_text}\n\n\
         Completed steps:\n{completed}\n\n\
         Remaining steps:\n{remaining}\n",
        user = request.user_input,
        name = request.recipe_name,
        description = request.recipe_description,
        position = index + 1,
    )
}

/// Outermost `{...}` span, for completions wrapped in prose or code fences.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Reads the model's JSON answer. Anything that is not a JSON object keeps the raw
/// text as the reply and lets the heuristic decide the advance.
pub fn parse_completion(raw: &str, user_input: &str) -> FallbackReply {
    let raw = raw.trim();
    let object = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .or_else(|| extract_json(raw).and_then(|s| serde_json::from_str(s).ok()))
        .and_then(|v| match v {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        });

    let Some(map) = object else {
        tracing::debug!(target: "souschef::llm", "Completion was not a JSON object");
        return FallbackReply {
            reply: if raw.is_empty() { EMPTY_REPLY.to_string() } else { raw.to_string() },
            advance_step: naive_advance(user_input),
        };
    };

    let reply = match map.get("reply") {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    FallbackReply {
        reply: if reply.is_empty() { EMPTY_REPLY.to_string() } else { reply },
        advance_step: map
            .get("advance_step")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
    }
}
