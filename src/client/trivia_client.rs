use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::{
    client::trivia_client_error::TriviaClientError,
    quiz::models::{Category, CategoryFilter, QuizOptions, RawQuestion},
};

/// Upstream result codes carried in the `response_code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    NoResults,
    InvalidParameter,
    TokenNotFound,
    TokenExhausted,
    RateLimited,
    Unknown(u8),
}

impl From<u8> for ResponseCode {
    fn from(code: u8) -> Self {
        match code {
            0 => ResponseCode::Success,
            1 => ResponseCode::NoResults,
            2 => ResponseCode::InvalidParameter,
            3 => ResponseCode::TokenNotFound,
            4 => ResponseCode::TokenExhausted,
            5 => ResponseCode::RateLimited,
            other => ResponseCode::Unknown(other),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub response_code: u8,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsResponse {
    pub response_code: u8,
    #[serde(default)]
    pub results: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    trivia_categories: Vec<Category>,
}

#[derive(Debug, Clone)]
pub struct TriviaClient {
    base_url: String,
}

impl TriviaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { base_url }
    }

    pub async fn request_token(&self, client: &Client) -> Result<String, TriviaClientError> {
        let url = format!("{}/api_token.php?command=request", self.base_url);
        let response: TokenResponse = self.get_json(client, &url).await?;
        Self::token_from(response)
    }

    pub async fn reset_token(
        &self,
        client: &Client,
        current: &str,
    ) -> Result<String, TriviaClientError> {
        let url = format!(
            "{}/api_token.php?command=reset&token={}",
            self.base_url, current
        );
        let response: TokenResponse = self.get_json(client, &url).await?;
        Self::token_from(response)
    }

    /// Filters left on "random" are omitted, the upstream reads absence as "any".
    pub async fn fetch_questions(
        &self,
        client: &Client,
        options: &QuizOptions,
        token: &str,
    ) -> Result<QuestionsResponse, TriviaClientError> {
        let mut query: Vec<(&str, String)> = vec![
            ("amount", options.question_count.to_string()),
            ("token", token.to_string()),
        ];
        if let CategoryFilter::Id(id) = options.category {
            query.push(("category", id.to_string()));
        }
        if let Some(difficulty) = options.difficulty.as_param() {
            query.push(("difficulty", difficulty.to_string()));
        }
        if let Some(question_type) = options.question_type.as_param() {
            query.push(("type", question_type.to_string()));
        }

        debug!(
            "Requesting {} questions from upstream",
            options.question_count
        );
        let url = format!("{}/api.php", self.base_url);
        let response = client.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or("No body".into());
            error!("Question request failed: {} - {}", status, body);
            return Err(TriviaClientError::Api(status, body));
        }

        Ok(response.json::<QuestionsResponse>().await?)
    }

    /// Category list for the configuration screen, sorted by name.
    pub async fn fetch_categories(
        &self,
        client: &Client,
    ) -> Result<Vec<Category>, TriviaClientError> {
        let url = format!("{}/api_category.php", self.base_url);
        let mut categories = self
            .get_json::<CategoriesResponse>(client, &url)
            .await?
            .trivia_categories;

        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        client: &Client,
        url: &str,
    ) -> Result<T, TriviaClientError> {
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or("No body".into());
            error!("Upstream request failed: {} - {}", status, body);
            return Err(TriviaClientError::Api(status, body));
        }

        Ok(response.json::<T>().await?)
    }

    fn token_from(response: TokenResponse) -> Result<String, TriviaClientError> {
        match response.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(TriviaClientError::MissingToken),
        }
    }
}
