//! LLM-backed skills for the Sous Chef: the model router and the fallback agent.

mod model_router;
mod sous_chef;

pub use model_router::{LlmError, LlmMode, ModelRouter};
pub use sous_chef::{build_context, parse_completion, SousChefAgent, SYSTEM_INSTRUCTIONS};
