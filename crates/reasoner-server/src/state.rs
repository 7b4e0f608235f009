use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use reasoner::conversation::Conversation;
use reasoner::turn::TurnDriver;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One chat, locked for the duration of a turn
pub type SharedConversation = Arc<Mutex<Conversation>>;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

struct SessionEntry {
    conversation: SharedConversation,
    last_touched: Instant,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<TurnDriver>,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    show_reasoning: bool,
    session_ttl: Duration,
}

impl AppState {
    pub fn new(driver: TurnDriver, show_reasoning: bool) -> Self {
        Self {
            driver: Arc::new(driver),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            show_reasoning,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Start an empty conversation and return its id.
    /// Idle sessions past their ttl are dropped first.
    pub fn create_session(&self) -> (String, SharedConversation) {
        let id = Uuid::new_v4().to_string();
        let mut conversation = Conversation::new();
        conversation.set_show_reasoning(self.show_reasoning);
        let conversation = Arc::new(Mutex::new(conversation));

        // A poisoned map only means another request panicked mid-insert
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        // A locked conversation has a turn running and is never idle
        sessions.retain(|_, entry| {
            entry.last_touched.elapsed() < self.session_ttl || entry.conversation.try_lock().is_err()
        });
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "dropped idle sessions");
        }
        sessions.insert(
            id.clone(),
            SessionEntry {
                conversation: conversation.clone(),
                last_touched: Instant::now(),
            },
        );
        (id, conversation)
    }

    /// Look up a session and mark it as used
    pub fn session(&self, id: &str) -> Option<SharedConversation> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.get_mut(id).map(|entry| {
            entry.last_touched = Instant::now();
            entry.conversation.clone()
        })
    }

    /// End a session. A turn still running keeps its own handle until it finishes.
    pub fn remove_session(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(id).is_some()
    }

    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reasoner::format::Pipeline;
    use reasoner::providers::mock::MockProvider;

    fn state() -> AppState {
        AppState::new(
            TurnDriver::new(Box::new(MockProvider::default()), Pipeline::default()),
            false,
        )
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let state = state();
        let (first, conversation) = state.create_session();
        let (second, _) = state.create_session();
        assert_ne!(first, second);

        conversation.lock().await.append_user("hi");
        assert!(state.session(&first).unwrap().lock().await.has_pending_user());
        assert!(state.session(&second).unwrap().lock().await.is_empty());
        assert!(!conversation.lock().await.show_reasoning());
        assert!(state.session("missing").is_none());
    }

    #[tokio::test]
    async fn test_remove_session() {
        let state = state();
        let (id, _) = state.create_session();
        assert!(state.remove_session(&id));
        assert!(state.session(&id).is_none());
        assert!(!state.remove_session(&id));
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let state = state().with_session_ttl(Duration::ZERO);
        let (idle, _) = state.create_session();
        let (busy, conversation) = state.create_session();
        assert!(state.session(&idle).is_none());

        let _guard = conversation.lock().await;
        state.create_session();
        assert!(state.session(&busy).is_some());
        assert_eq!(state.session_count(), 2);
    }
}
