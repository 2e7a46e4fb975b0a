//! Session storage: opaque session id -> cooking state + transcript.
//!
//! The command engine never talks to a store. The [`Kitchen`](crate::Kitchen) reads the
//! state before dispatch and writes the result back afterwards; one request per session
//! is expected to be in flight at a time.

mod memory;
mod sled_store;

pub use memory::MemorySessionStore;
pub use sled_store::SledSessionStore;

use crate::error::Result;
use crate::state::CookingState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: CookingState,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Unix timestamp (milliseconds) when the session was created.
    pub created_ms: i64,
}

impl Session {
    /// New session with a random id, bound to `recipe_key`.
    pub fn new(recipe_key: &str) -> Self {
        let created_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            id: Uuid::new_v4().to_string(),
            state: CookingState::new(recipe_key),
            messages: Vec::new(),
            created_ms,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            recipe_key: self.state.recipe_key.clone(),
            current_step: self.state.current_step,
            message_count: self.messages.len(),
            created_ms: self.created_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub recipe_key: String,
    pub current_step: usize,
    pub message_count: usize,
    pub created_ms: i64,
}

/// Owner of session lifecycle. Unknown ids yield `SessionNotFound`.
pub trait SessionStore: Send + Sync {
    /// Creates a session bound to `recipe_key` with default state.
    fn create(&self, recipe_key: &str) -> Result<Session>;

    fn get(&self, id: &str) -> Result<Session>;

    /// Replaces the cooking state wholesale.
    fn replace(&self, id: &str, state: CookingState) -> Result<()>;

    /// Appends to the transcript in order.
    fn append_messages(&self, id: &str, messages: Vec<ChatMessage>) -> Result<()>;

    /// Writes the state and appends the turn's messages in one update; either both
    /// land or neither does.
    fn record_turn(&self, id: &str, state: CookingState, messages: Vec<ChatMessage>) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;

    /// Summaries ordered by creation time, oldest first.
    fn list(&self) -> Result<Vec<SessionSummary>>;
}
