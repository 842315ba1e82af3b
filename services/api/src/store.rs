//! In-Memory Session Store
//!
//! Sessions live for the lifetime of the process and are never evicted.
//! Writes are last-write-wins with no versioning; the streaming handlers
//! overwrite a session's field once per emitted frame, so the stored value
//! after a clean stream equals the final accumulated text.

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::Session;

/// Abstraction over session persistence, injected into the handlers.
pub trait SessionStore: Send + Sync {
    /// Creates a session with a fresh, never-reused identifier.
    /// `outline` and `lessons` start unset.
    fn create(&self, title: &str, description: &str) -> Uuid;

    /// Looks up a session by id.
    fn get(&self, session_id: Uuid) -> Option<Session>;

    /// Overwrites the stored outline. Last write wins.
    fn set_outline(&self, session_id: Uuid, outline: String);

    /// Overwrites the stored lessons. Last write wins.
    fn set_lessons(&self, session_id: Uuid, lessons: String);
}

/// Process-wide store backed by a concurrent map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, title: &str, description: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Session {
                id,
                title: title.to_string(),
                description: description.to_string(),
                outline: None,
                lessons: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    fn get(&self, session_id: Uuid) -> Option<Session> {
        self.sessions.get(&session_id).map(|entry| entry.clone())
    }

    fn set_outline(&self, session_id: Uuid, outline: String) {
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            session.outline = Some(outline);
        }
    }

    fn set_lessons(&self, session_id: Uuid, lessons: String) {
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            session.lessons = Some(lessons);
        }
    }
}
