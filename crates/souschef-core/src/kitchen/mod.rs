//! Kitchen: drives one conversational turn across library, session store and fallback.
//!
//! Per message the engine runs first. A restart swaps the whole state (the recipe may
//! change with it), a handled command applies its state or advance signal, and anything
//! else goes to the [`FallbackAdapter`] under a deadline. The updated state and the
//! exchange are written back in one store call before the report is returned.

use crate::engine::{self, Dispatch};
use crate::error::{Result, SousChefError};
use crate::fallback::{naive_advance, FallbackAdapter, FallbackReply, FallbackRequest};
use crate::recipe::{Recipe, RecipeLibrary};
use crate::session::{ChatMessage, SessionStore};
use crate::state::CookingState;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(20);

const TIMEOUT_REPLY: &str =
    "Sorry, I'm having trouble thinking right now. Say 'next' when you're ready for the next step.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStart {
    pub session_id: String,
    pub recipe_name: String,
    pub reply: String,
}

/// Outcome of one message: the reply plus a snapshot of progress after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub reply: String,
    /// False when the reply came from the fallback.
    pub handled: bool,
    /// The session was restarted, possibly on a different recipe.
    pub restarted: bool,
    pub recipe_key: String,
    pub current_step: usize,
    pub total_steps: usize,
    pub ingredients: Vec<String>,
    pub strikes: Vec<String>,
    pub substitutions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub recipe_key: String,
    pub recipe_name: String,
    pub current_step: usize,
    pub total_steps: usize,
    pub message_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionListing {
    pub session_id: String,
    pub recipe_key: String,
    pub recipe_name: String,
    pub current_step: usize,
    pub message_count: usize,
}

pub struct Kitchen {
    library: Arc<RecipeLibrary>,
    store: Arc<dyn SessionStore>,
    fallback: Arc<dyn FallbackAdapter>,
    fallback_timeout: Duration,
}

impl Kitchen {
    pub fn new(
        library: Arc<RecipeLibrary>,
        store: Arc<dyn SessionStore>,
        fallback: Arc<dyn FallbackAdapter>,
    ) -> Self {
        Self {
            library,
            store,
            fallback,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }

    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    pub fn library(&self) -> &RecipeLibrary {
        &self.library
    }

    pub fn start_session(&self, recipe_key: &str) -> Result<SessionStart> {
        let recipe = self.library.require(recipe_key)?;
        let session = self.store.create(recipe_key)?;
        let reply = recipe.greeting();
        self.store
            .append_messages(&session.id, vec![ChatMessage::assistant(reply.clone())])?;
        tracing::info!(
            target: "souschef::kitchen",
            session_id = %session.id,
            recipe = %recipe_key,
            "Session started"
        );
        Ok(SessionStart {
            session_id: session.id,
            recipe_name: recipe.name.clone(),
            reply,
        })
    }

    pub async fn send_message(&self, session_id: &str, text: &str) -> Result<TurnReport> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SousChefError::EmptyMessage);
        }
        let session = self.store.get(session_id)?;
        let mut state = session.state;
        let recipe = self.library.require(&state.recipe_key)?;

        let outcome = engine::dispatch(text, &state, recipe, &self.library);
        let handled = outcome.handled();
        let restarted = outcome.is_restart();
        let reply = match outcome {
            Dispatch::Restart { reply, new_state } => {
                state = new_state;
                reply
            }
            Dispatch::Handled {
                reply,
                new_state,
                advance_step,
            } => {
                match new_state {
                    Some(next) => state = next,
                    None if advance_step => {
                        state.advance(recipe.step_count());
                    }
                    None => {}
                }
                reply
            }
            Dispatch::Unhandled => {
                let answer = self.ask_fallback(session_id, text, &state, recipe).await;
                if answer.advance_step {
                    state.advance(recipe.step_count());
                }
                answer.reply
            }
        };

        self.store.record_turn(
            session_id,
            state.clone(),
            vec![ChatMessage::user(text), ChatMessage::assistant(reply.clone())],
        )?;

        let recipe = self.library.require(&state.recipe_key)?;
        Ok(TurnReport {
            reply,
            handled,
            restarted,
            recipe_key: state.recipe_key.clone(),
            current_step: state.current_step,
            total_steps: recipe.step_count(),
            ingredients: recipe.ingredients.clone(),
            strikes: state.ingredient_strikes.iter().cloned().collect(),
            substitutions: state.ingredient_subs,
        })
    }

    async fn ask_fallback(
        &self,
        session_id: &str,
        text: &str,
        state: &CookingState,
        recipe: &Recipe,
    ) -> FallbackReply {
        let request = FallbackRequest {
            user_input: text,
            recipe_name: &recipe.name,
            recipe_description: &recipe.description,
            steps: &recipe.steps,
            ingredients: &recipe.ingredients,
            substitutions: &state.ingredient_subs,
            current_step: state.current_step,
        };
        match tokio::time::timeout(self.fallback_timeout, self.fallback.respond(&request)).await {
            Ok(answer) => answer,
            Err(_) => {
                tracing::warn!(
                    target: "souschef::kitchen",
                    session_id = %session_id,
                    timeout_ms = self.fallback_timeout.as_millis() as u64,
                    "Fallback timed out; using heuristic advance"
                );
                FallbackReply {
                    reply: TIMEOUT_REPLY.to_string(),
                    advance_step: naive_advance(text),
                }
            }
        }
    }

    pub fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        let session = self.store.get(session_id)?;
        let recipe = self.library.require(&session.state.recipe_key)?;
        Ok(SessionStatus {
            session_id: session.id,
            recipe_key: session.state.recipe_key.clone(),
            recipe_name: recipe.name.clone(),
            current_step: session.state.current_step,
            total_steps: recipe.step_count(),
            message_count: session.messages.len(),
        })
    }

    pub fn end_session(&self, session_id: &str) -> Result<()> {
        self.store.delete(session_id)?;
        tracing::info!(target: "souschef::kitchen", session_id = %session_id, "Session ended");
        Ok(())
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionListing>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|s| SessionListing {
                recipe_name: self
                    .library
                    .get(&s.recipe_key)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                session_id: s.session_id,
                recipe_key: s.recipe_key,
                current_step: s.current_step,
                message_count: s.message_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, Role};
    use std::sync::Mutex;

    /// Replays canned replies and records what it was asked.
    struct ScriptedFallback {
        replies: Mutex<Vec<FallbackReply>>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedFallback {
        fn new(replies: Vec<FallbackReply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl FallbackAdapter for ScriptedFallback {
        async fn respond(&self, request: &FallbackRequest<'_>) -> FallbackReply {
            self.seen
                .lock()
                .unwrap()
                .push((request.user_input.to_string(), request.current_step));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                FallbackReply {
                    reply: "No more script.".into(),
                    advance_step: false,
                }
            } else {
                replies.remove(0)
            }
        }
    }

    struct SlowFallback;

    #[async_trait::async_trait]
    impl FallbackAdapter for SlowFallback {
        async fn respond(&self, _request: &FallbackRequest<'_>) -> FallbackReply {
            tokio::time::sleep(Duration::from_secs(5)).await;
            FallbackReply {
                reply: "too late".into(),
                advance_step: false,
            }
        }
    }

    /// Delegates to memory but refuses to record turns.
    struct FullDiskStore(MemorySessionStore);

    impl SessionStore for FullDiskStore {
        fn create(&self, recipe_key: &str) -> Result<crate::session::Session> {
            self.0.create(recipe_key)
        }
        fn get(&self, id: &str) -> Result<crate::session::Session> {
            self.0.get(id)
        }
        fn replace(&self, id: &str, state: CookingState) -> Result<()> {
            self.0.replace(id, state)
        }
        fn append_messages(&self, id: &str, messages: Vec<ChatMessage>) -> Result<()> {
            self.0.append_messages(id, messages)
        }
        fn record_turn(&self, _id: &str, _state: CookingState, _messages: Vec<ChatMessage>) -> Result<()> {
            Err(SousChefError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
        fn delete(&self, id: &str) -> Result<()> {
            self.0.delete(id)
        }
        fn list(&self) -> Result<Vec<crate::session::SessionSummary>> {
            self.0.list()
        }
    }

    fn kitchen(fallback: Arc<dyn FallbackAdapter>) -> Kitchen {
        Kitchen::new(
            Arc::new(RecipeLibrary::builtin()),
            Arc::new(MemorySessionStore::new()),
            fallback,
        )
    }

    #[tokio::test]
    async fn start_session_greets_and_records_transcript() {
        let k = kitchen(ScriptedFallback::new(vec![]));
        let start = k.start_session("garlic_pasta").unwrap();
        assert_eq!(start.recipe_name, "Simple Garlic Pasta");
        assert!(start.reply.starts_with("Let's cook Simple Garlic Pasta!"));
        let status = k.session_status(&start.session_id).unwrap();
        assert_eq!(status.message_count, 1);
        assert_eq!(status.current_step, 0);
        assert_eq!(status.total_steps, 7);
    }

    #[tokio::test]
    async fn unknown_recipe_is_not_found() {
        let k = kitchen(ScriptedFallback::new(vec![]));
        assert!(matches!(
            k.start_session("beef_wellington"),
            Err(SousChefError::RecipeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let k = kitchen(ScriptedFallback::new(vec![]));
        let start = k.start_session("garlic_pasta").unwrap();
        assert!(matches!(
            k.send_message(&start.session_id, "   ").await,
            Err(SousChefError::EmptyMessage)
        ));
        assert!(matches!(
            k.send_message("nope", "next").await,
            Err(SousChefError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn commands_update_state_without_fallback() {
        let fallback = ScriptedFallback::new(vec![]);
        let k = kitchen(fallback.clone());
        let id = k.start_session("garlic_pasta").unwrap().session_id;

        let report = k.send_message(&id, "next").await.unwrap();
        assert!(report.handled);
        assert_eq!(report.current_step, 1);
        assert!(report.reply.starts_with("Next step:\n\n1. "));

        let report = k.send_message(&id, "x 3").await.unwrap();
        assert_eq!(report.current_step, 3);
        assert_eq!(report.total_steps, 7);
        let pasta = RecipeLibrary::builtin();
        assert_eq!(
            report.ingredients,
            pasta.require("garlic_pasta").unwrap().ingredients
        );

        assert!(fallback.seen.lock().unwrap().is_empty());
        // greeting + two exchanges
        assert_eq!(k.session_status(&id).unwrap().message_count, 5);
    }

    #[tokio::test]
    async fn fallback_reply_can_advance() {
        let fallback = ScriptedFallback::new(vec![FallbackReply {
            reply: "Nice, the garlic sounds ready.".into(),
            advance_step: true,
        }]);
        let k = kitchen(fallback.clone());
        let id = k.start_session("garlic_pasta").unwrap().session_id;

        let report = k.send_message(&id, "the garlic is golden now").await.unwrap();
        assert!(!report.handled);
        assert_eq!(report.reply, "Nice, the garlic sounds ready.");
        assert_eq!(report.current_step, 1);
        assert_eq!(
            fallback.seen.lock().unwrap().as_slice(),
            &[("the garlic is golden now".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn fallback_advance_stops_at_completion() {
        let replies = (0..3)
            .map(|_| FallbackReply {
                reply: "Good.".into(),
                advance_step: true,
            })
            .collect();
        let k = kitchen(ScriptedFallback::new(replies));
        let id = k.start_session("scrambled_eggs").unwrap().session_id;
        k.send_message(&id, "x 5").await.unwrap();
        for _ in 0..3 {
            k.send_message(&id, "all plated up").await.unwrap();
        }
        assert_eq!(k.session_status(&id).unwrap().current_step, 6);
    }

    #[tokio::test]
    async fn fallback_timeout_degrades_to_heuristic() {
        let k = kitchen(Arc::new(SlowFallback)).with_fallback_timeout(Duration::from_millis(20));
        let id = k.start_session("garlic_pasta").unwrap().session_id;

        let report = k.send_message(&id, "alright, I'm finished with that").await.unwrap();
        assert_eq!(report.reply, TIMEOUT_REPLY);
        assert_eq!(report.current_step, 1);

        let report = k.send_message(&id, "is the pan hot enough?").await.unwrap();
        assert_eq!(report.current_step, 1);
    }

    #[tokio::test]
    async fn reset_restarts_and_clears_progress() {
        let k = kitchen(ScriptedFallback::new(vec![]));
        let id = k.start_session("garlic_pasta").unwrap().session_id;
        k.send_message(&id, "x 4").await.unwrap();

        let report = k.send_message(&id, "start over").await.unwrap();
        assert!(report.restarted);
        assert_eq!(report.current_step, 0);
        assert!(report.reply.starts_with("Let's cook Simple Garlic Pasta!"));
    }

    #[tokio::test]
    async fn pick_switches_recipe() {
        let k = kitchen(ScriptedFallback::new(vec![]));
        let id = k.start_session("garlic_pasta").unwrap().session_id;
        k.send_message(&id, "pick").await.unwrap();
        let report = k.send_message(&id, "eggs").await.unwrap();
        assert!(report.reply.contains("1. Soft Scrambled Eggs"));

        let report = k.send_message(&id, "1").await.unwrap();
        assert!(report.restarted);
        assert_eq!(report.recipe_key, "scrambled_eggs");
        assert_eq!(report.total_steps, 6);
        assert_eq!(k.list_sessions().unwrap()[0].recipe_name, "Soft Scrambled Eggs");
    }

    #[tokio::test]
    async fn end_session_removes_it() {
        let k = kitchen(ScriptedFallback::new(vec![]));
        let id = k.start_session("garlic_pasta").unwrap().session_id;
        k.end_session(&id).unwrap();
        assert!(k.list_sessions().unwrap().is_empty());
        assert!(matches!(k.end_session(&id), Err(SousChefError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn failed_turn_write_leaves_session_untouched() {
        let k = Kitchen::new(
            Arc::new(RecipeLibrary::builtin()),
            Arc::new(FullDiskStore(MemorySessionStore::new())),
            ScriptedFallback::new(vec![]),
        );
        let id = k.start_session("garlic_pasta").unwrap().session_id;

        assert!(matches!(
            k.send_message(&id, "next").await,
            Err(SousChefError::Io(_))
        ));
        let status = k.session_status(&id).unwrap();
        assert_eq!(status.current_step, 0);
        assert_eq!(status.message_count, 1);
    }

    #[tokio::test]
    async fn transcript_alternates_roles() {
        let store = Arc::new(MemorySessionStore::new());
        let k = Kitchen::new(
            Arc::new(RecipeLibrary::builtin()),
            store.clone(),
            Arc::new(SlowFallback),
        );
        let id = k.start_session("garlic_pasta").unwrap().session_id;
        k.send_message(&id, "i").await.unwrap();
        let roles: Vec<Role> = store.get(&id).unwrap().messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }
}
