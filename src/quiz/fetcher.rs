use reqwest::Client;
use tracing::{info, warn};

use crate::{
    client::trivia_client::{ResponseCode, TriviaClient},
    engine::error::QuizError,
    quiz::models::{DisplayQuestion, QuizOptions},
    token::manager::TokenManager,
};

#[derive(Clone)]
pub struct QuestionFetcher {
    trivia: TriviaClient,
    tokens: TokenManager,
}

impl QuestionFetcher {
    pub fn new(trivia: TriviaClient, tokens: TokenManager) -> Self {
        Self { trivia, tokens }
    }

    /// Fetches and normalizes one question set. When the upstream reports
    /// the token as exhausted or unknown, the token is replaced exactly once
    /// and the same request is retried; a second such code is fatal for this
    /// call. The caller persists the result.
    pub async fn fetch(
        &self,
        client: &Client,
        options: &QuizOptions,
    ) -> Result<Vec<DisplayQuestion>, QuizError> {
        let mut token = match self.tokens.current() {
            Some(token) => token,
            None => self.tokens.acquire(client).await?,
        };

        let mut token_replaced = false;
        loop {
            let response = self
                .trivia
                .fetch_questions(client, options, &token.token)
                .await?;

            match ResponseCode::from(response.response_code) {
                ResponseCode::Success => {
                    if response.results.is_empty() {
                        return Err(QuizError::MalformedResponse(
                            "success response carried no questions".into(),
                        ));
                    }
                    info!("Fetched {} questions from upstream", response.results.len());
                    return Ok(response
                        .results
                        .into_iter()
                        .map(DisplayQuestion::from_raw)
                        .collect());
                }
                ResponseCode::TokenExhausted if !token_replaced => {
                    warn!("Token has served every question for this filter, refreshing once");
                    token = self.tokens.refresh(client, &token).await?;
                    token_replaced = true;
                }
                ResponseCode::TokenNotFound if !token_replaced => {
                    warn!("Upstream no longer knows this token, acquiring a new one");
                    token = self.tokens.acquire(client).await?;
                    token_replaced = true;
                }
                ResponseCode::TokenExhausted | ResponseCode::TokenNotFound => {
                    return Err(QuizError::PoolExhausted);
                }
                code => {
                    warn!("Upstream rejected the question request: {:?}", code);
                    return Err(QuizError::InsufficientQuestions);
                }
            }
        }
    }
}
