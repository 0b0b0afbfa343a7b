use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::{
    auth::models::{Identity, UserRecord},
    quiz::models::{QuizOptions, QuizSession},
    store::backend::{StorageBackend, StoreError},
    token::manager::StoredToken,
};

const TOKEN_KEY: &str = "api_token";
const OPTIONS_KEY: &str = "quiz-options";
const SESSION_KEY: &str = "quiz-session";
const USERS_KEY: &str = "users";
const IDENTITY_KEY: &str = "user";

/// Typed view over the storage port. One record per key; a record that
/// fails to read or parse counts as absent, never as an error.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn load_session(&self) -> Option<QuizSession> {
        self.load(SESSION_KEY)
    }

    pub fn save_session(&self, session: &QuizSession) -> Result<(), StoreError> {
        self.save(SESSION_KEY, session)
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.backend.remove(SESSION_KEY)
    }

    pub fn load_options(&self) -> Option<QuizOptions> {
        self.load(OPTIONS_KEY)
    }

    pub fn save_options(&self, options: &QuizOptions) -> Result<(), StoreError> {
        self.save(OPTIONS_KEY, options)
    }

    pub fn load_token(&self) -> Option<StoredToken> {
        self.load(TOKEN_KEY)
    }

    pub fn save_token(&self, token: &StoredToken) -> Result<(), StoreError> {
        self.save(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<(), StoreError> {
        self.backend.remove(TOKEN_KEY)
    }

    pub fn load_users(&self) -> Option<Vec<UserRecord>> {
        self.load(USERS_KEY)
    }

    pub fn save_users(&self, users: &[UserRecord]) -> Result<(), StoreError> {
        self.save(USERS_KEY, &users)
    }

    pub fn load_identity(&self) -> Option<Identity> {
        self.load(IDENTITY_KEY)
    }

    pub fn save_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        self.save(IDENTITY_KEY, identity)
    }

    pub fn clear_identity(&self) -> Result<(), StoreError> {
        self.backend.remove(IDENTITY_KEY)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read record '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt record '{}': {}", key, e);
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.backend.write(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        quiz::models::{DisplayQuestion, RawQuestion},
        store::backend::MemoryBackend,
    };

    fn memory_store() -> (Arc<MemoryBackend>, SessionStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SessionStore::new(backend.clone());
        (backend, store)
    }

    fn sample_session() -> QuizSession {
        let raw = RawQuestion {
            question_type: "boolean".into(),
            difficulty: "easy".into(),
            category: "General Knowledge".into(),
            question: "The sky is blue.".into(),
            correct_answer: "True".into(),
            incorrect_answers: vec!["False".into()],
        };
        QuizSession::new(vec![DisplayQuestion::from_raw(raw)], 120)
    }

    #[test]
    fn session_round_trip() {
        let (_, store) = memory_store();
        let session = sample_session();

        store.save_session(&session).unwrap();
        assert_eq!(store.load_session(), Some(session));
    }

    #[test]
    fn corrupt_session_counts_as_absent() {
        let (backend, store) = memory_store();

        backend.write("quiz-session", "{not json").unwrap();
        assert!(store.load_session().is_none());
    }

    #[test]
    fn clear_session_leaves_token_and_options() {
        let (_, store) = memory_store();
        let session = sample_session();

        store.save_session(&session).unwrap();
        store
            .save_token(&StoredToken::new("tok-1".to_string()))
            .unwrap();
        store.clear_session().unwrap();

        assert!(store.load_session().is_none());
        assert_eq!(store.load_token().map(|t| t.token), Some("tok-1".into()));
    }

    #[tokio::test]
    async fn concurrent_writes_leave_one_whole_record() {
        let (_, store) = memory_store();

        let mut first = sample_session();
        first.remaining_seconds = 10;
        let mut second = sample_session();
        second.remaining_seconds = 20;

        let mut handles = Vec::new();
        for session in [first.clone(), second.clone()] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save_session(&session).unwrap();
            }));
        }
        futures::future::join_all(handles).await;

        // Whichever write landed last, the record parses as one full session.
        let loaded = store.load_session().unwrap();
        assert!(loaded.remaining_seconds == 10 || loaded.remaining_seconds == 20);
        assert_eq!(loaded.questions.len(), 1);
    }
}
