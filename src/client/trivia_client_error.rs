use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum TriviaClientError {
    #[error("Http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Api error: {0} - {1}")]
    Api(StatusCode, String),

    #[error("Upstream response did not contain a token")]
    MissingToken,

    #[error("Failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),
}
