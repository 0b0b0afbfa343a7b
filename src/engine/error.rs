use crate::{client::trivia_client_error::TriviaClientError, store::backend::StoreError};

/// Engine-level failures. None of these are fatal to the process; all
/// degrade to a dismissible message and a safe fallback state.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Http request failed: {0}")]
    Network(#[from] TriviaClientError),

    #[error("The token has served every question matching the current filter")]
    PoolExhausted,

    #[error("Not enough questions available for the requested filter")]
    InsufficientQuestions,

    #[error("Upstream response was malformed: {0}")]
    MalformedResponse(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid quiz options: {0}")]
    InvalidOptions(&'static str),

    #[error("Another initialization is already in flight")]
    Busy,
}

impl QuizError {
    /// Banner text for the presentation layer. Malformed responses read as
    /// network trouble to the user; the log line carries the distinction.
    pub fn user_message(&self) -> String {
        match self {
            QuizError::Network(TriviaClientError::Api(status, _)) => format!(
                "The trivia service answered with HTTP {}. Try again in a moment.",
                status
            ),
            QuizError::Network(_) | QuizError::MalformedResponse(_) => {
                "Could not reach the trivia service. Check your connection and try again.".into()
            }
            QuizError::PoolExhausted => {
                "You have played through every question for this filter. Pick another category or difficulty.".into()
            }
            QuizError::InsufficientQuestions => {
                "The trivia service does not have enough questions for this filter. Loosen the filter and try again.".into()
            }
            QuizError::Storage(_) => "Could not save your progress locally.".into(),
            QuizError::InvalidOptions(reason) => format!("Invalid quiz options: {}", reason),
            QuizError::Busy => "A quiz is already being prepared.".into(),
        }
    }
}
