//! Sled-backed session store: one tree, session id -> JSON-encoded [`Session`].

use super::{ChatMessage, Session, SessionStore, SessionSummary};
use crate::error::{Result, SousChefError};
use crate::state::CookingState;
use sled::Db;
use std::path::Path;

const SESSIONS_TREE: &str = "sessions";

pub struct SledSessionStore {
    db: Db,
}

impl SledSessionStore {
    /// Opens or creates the session DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(SESSIONS_TREE)?)
    }

    fn put(&self, session: &Session) -> Result<()> {
        let bytes = serde_json::to_vec(session)?;
        self.tree()?.insert(session.id.as_bytes(), bytes)?;
        Ok(())
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut Session)) -> Result<()> {
        let mut session = self.get(id)?;
        f(&mut session);
        self.put(&session)
    }
}

impl SessionStore for SledSessionStore {
    fn create(&self, recipe_key: &str) -> Result<Session> {
        let session = Session::new(recipe_key);
        self.put(&session)?;
        Ok(session)
    }

    fn get(&self, id: &str) -> Result<Session> {
        let bytes = self
            .tree()?
            .get(id.as_bytes())?
            .ok_or_else(|| SousChefError::SessionNotFound(id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn replace(&self, id: &str, state: CookingState) -> Result<()> {
        self.modify(id, |s| s.state = state)
    }

    fn append_messages(&self, id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        self.modify(id, |s| s.messages.extend(messages))
    }

    fn record_turn(&self, id: &str, state: CookingState, messages: Vec<ChatMessage>) -> Result<()> {
        self.modify(id, |s| {
            s.state = state;
            s.messages.extend(messages);
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.tree()?
            .remove(id.as_bytes())?
            .map(|_| ())
            .ok_or_else(|| SousChefError::SessionNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for item in self.tree()?.iter() {
            let (key, value) = item?;
            match serde_json::from_slice::<Session>(&value) {
                Ok(session) => summaries.push(session.summary()),
                Err(e) => tracing::warn!(
                    target: "souschef::sessions",
                    key = %String::from_utf8_lossy(&key),
                    error = %e,
                    "Skipping undecodable session record"
                ),
            }
        }
        summaries.sort_by(|a, b| {
            a.created_ms
                .cmp(&b.created_ms)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sled_store_honours_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledSessionStore::open_path(dir.path().join("sessions")).unwrap();
        super::super::contract::exercise(&store);
    }

    #[test]
    fn sessions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions");
        let id = {
            let store = SledSessionStore::open_path(&path).unwrap();
            let session = store.create("garlic_pasta").unwrap();
            let mut state = session.state.clone();
            state.current_step = 2;
            store.replace(&session.id, state).unwrap();
            store.db.flush().unwrap();
            session.id
        };
        let store = SledSessionStore::open_path(&path).unwrap();
        assert_eq!(store.get(&id).unwrap().state.current_step, 2);
    }
}
