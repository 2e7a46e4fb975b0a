//! souschef-core: recipe library, cooking state, command engine and session plumbing.
//!
//! The engine is pure; the [`Kitchen`] is the only piece that touches session storage
//! and the LLM fallback, so the gateway and tests share one turn implementation.

mod engine;
mod error;
mod fallback;
mod format;
mod kitchen;
mod recipe;
mod session;
mod shared;
mod state;

// Configuration and errors
pub use error::{ErrorKind, Result, SousChefError};
pub use shared::{CoreConfig, SessionBackend};

// Recipes and per-session state
pub use recipe::{slugify, CatalogEntry, Recipe, RecipeLibrary};
pub use state::CookingState;

// Command engine
pub use engine::{dispatch, rule_order, Dispatch};
pub use format::{ingredient_display, render_ingredients, render_steps, COMMANDS_CONDENSED};

// Fallback seam
pub use fallback::{naive_advance, FallbackAdapter, FallbackReply, FallbackRequest};

// Sessions and turn orchestration
pub use kitchen::{Kitchen, SessionListing, SessionStart, SessionStatus, TurnReport};
pub use session::{
    ChatMessage, MemorySessionStore, Role, Session, SessionStore, SessionSummary,
    SledSessionStore,
};
