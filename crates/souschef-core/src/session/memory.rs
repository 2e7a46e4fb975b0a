use super::{ChatMessage, Session, SessionStore, SessionSummary};
use crate::error::{Result, SousChefError};
use crate::state::CookingState;
use dashmap::DashMap;

/// Process-memory store; sessions end with the process.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SousChefError::SessionNotFound(id.to_string()))?;
        Ok(f(entry.value_mut()))
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, recipe_key: &str) -> Result<Session> {
        let session = Session::new(recipe_key);
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, id: &str) -> Result<Session> {
        self.sessions
            .get(id)
            .map(|s| s.value().clone())
            .ok_or_else(|| SousChefError::SessionNotFound(id.to_string()))
    }

    fn replace(&self, id: &str, state: CookingState) -> Result<()> {
        self.with_session(id, |s| s.state = state)
    }

    fn append_messages(&self, id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        self.with_session(id, |s| s.messages.extend(messages))
    }

    fn record_turn(&self, id: &str, state: CookingState, messages: Vec<ChatMessage>) -> Result<()> {
        self.with_session(id, |s| {
            s.state = state;
            s.messages.extend(messages);
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SousChefError::SessionNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> =
            self.sessions.iter().map(|s| s.value().summary()).collect();
        summaries.sort_by(|a, b| {
            a.created_ms
                .cmp(&b.created_ms)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(summaries)
    }
}
