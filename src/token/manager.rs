use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    client::trivia_client::TriviaClient, engine::error::QuizError, store::backend::StoreError,
    store::session_store::SessionStore,
};

/// The single process-wide upstream credential. The upstream scopes which
/// questions it considers already served by this value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredToken {
    pub token: String,
    pub acquired_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(token: String) -> Self {
        Self {
            token,
            acquired_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct TokenManager {
    trivia: TriviaClient,
    store: SessionStore,
}

impl TokenManager {
    pub fn new(trivia: TriviaClient, store: SessionStore) -> Self {
        Self { trivia, store }
    }

    pub fn current(&self) -> Option<StoredToken> {
        self.store.load_token()
    }

    /// Mints a fresh token and writes it through to the store. Callers
    /// decide retry policy, nothing is retried here.
    pub async fn acquire(&self, client: &Client) -> Result<StoredToken, QuizError> {
        let token = self.trivia.request_token(client).await?;
        let stored = StoredToken::new(token);
        self.store.save_token(&stored)?;

        info!("Acquired new upstream session token");
        Ok(stored)
    }

    /// Reissues the token. The previous value is invalid upstream once this
    /// returns, whether or not the caller keeps a copy.
    pub async fn refresh(
        &self,
        client: &Client,
        current: &StoredToken,
    ) -> Result<StoredToken, QuizError> {
        let token = self.trivia.reset_token(client, &current.token).await?;
        let stored = StoredToken::new(token);
        self.store.save_token(&stored)?;

        info!("Refreshed upstream session token");
        Ok(stored)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear_token()
    }
}
