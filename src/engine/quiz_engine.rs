use std::sync::Arc;

use reqwest::Client;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Duration;
use tracing::{debug, error, info};

use crate::{
    client::{trivia_client::TriviaClient, trivia_client_error::TriviaClientError},
    config::config::{AppConfig, CONFIG},
    engine::error::QuizError,
    quiz::{
        fetcher::QuestionFetcher,
        models::{Category, DisplayQuestion, QuizOptions, QuizSession, Stats},
    },
    store::{
        backend::{FileBackend, StorageBackend},
        session_store::SessionStore,
    },
    timer::countdown::{CountdownTimer, TimerEvent},
    token::manager::TokenManager,
};

/// The engine context: one per process, owning the single token and session
/// slots. All mutations run synchronously inside discrete events on the
/// caller's task; the network fetch during initialization is the only
/// suspending operation.
pub struct QuizEngine {
    client: Client,
    trivia: TriviaClient,
    store: SessionStore,
    tokens: TokenManager,
    fetcher: QuestionFetcher,
    timer: CountdownTimer,
    session: Option<QuizSession>,
    current: usize,
    terminal: bool,
    loading: bool,
    last_error: Option<String>,
}

impl QuizEngine {
    pub fn from_env() -> Result<Self, QuizError> {
        dotenv::dotenv().ok();
        let config = CONFIG.clone();
        let backend = FileBackend::new(&config.storage.dir)?;
        Self::new(&config, Arc::new(backend))
    }

    pub fn new(config: &AppConfig, backend: Arc<dyn StorageBackend>) -> Result<Self, QuizError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(TriviaClientError::Http)?;

        let trivia = TriviaClient::new(&config.api.base_url);
        let store = SessionStore::new(backend);
        let tokens = TokenManager::new(trivia.clone(), store.clone());
        let fetcher = QuestionFetcher::new(trivia.clone(), tokens.clone());

        Ok(Self {
            client,
            trivia,
            store,
            tokens,
            fetcher,
            timer: CountdownTimer::new(),
            session: None,
            current: 1,
            terminal: false,
            loading: false,
            last_error: None,
        })
    }

    /// Discards any persisted session, then initializes a fresh one.
    pub async fn start_new(
        &mut self,
        options: QuizOptions,
    ) -> Result<UnboundedReceiver<TimerEvent>, QuizError> {
        if self.loading {
            debug!("Initialization already in flight, ignoring start");
            return Err(QuizError::Busy);
        }
        self.store.clear_session()?;

        self.initialize(options).await
    }

    /// Adopts a persisted session when one exists, the passed options only
    /// matter when there is nothing to resume.
    pub async fn resume(
        &mut self,
        options: QuizOptions,
    ) -> Result<UnboundedReceiver<TimerEvent>, QuizError> {
        self.initialize(options).await
    }

    async fn initialize(
        &mut self,
        options: QuizOptions,
    ) -> Result<UnboundedReceiver<TimerEvent>, QuizError> {
        if self.loading {
            debug!("Initialization already in flight, ignoring");
            return Err(QuizError::Busy);
        }
        options.validate()?;

        self.loading = true;
        self.last_error = None;
        let result = self.initialize_inner(&options).await;
        self.loading = false;

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to initialize quiz session: {}", e);
                self.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        let remaining = session.remaining_seconds;
        self.session = Some(session);
        self.current = 1;
        self.terminal = false;

        // A clock from an earlier run must not survive into this session.
        self.timer.stop();
        self.timer.start(remaining).ok_or(QuizError::Busy)
    }

    async fn initialize_inner(&mut self, options: &QuizOptions) -> Result<QuizSession, QuizError> {
        if let Some(session) = self.store.load_session() {
            info!(
                "Resuming persisted session: {} questions, {}s left",
                session.questions.len(),
                session.remaining_seconds
            );
            return Ok(session);
        }

        let questions = self.fetcher.fetch(&self.client, options).await?;
        let session = QuizSession::new(questions, options.timer_seconds);
        self.store.save_session(&session)?;
        self.store.save_options(options)?;
        info!(
            "Started new session: {} questions, {}s on the clock",
            session.questions.len(),
            session.remaining_seconds
        );

        Ok(session)
    }

    /// Applies a timer event; returns final stats when the event ended the
    /// session.
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> Option<Stats> {
        match event {
            TimerEvent::Tick(_) => self.on_tick(),
            TimerEvent::Expired => self.on_expired(),
        }
    }

    /// One-second decrement. Writes the full session through to the store;
    /// at zero the session goes terminal, same outcome as `submit`.
    pub fn on_tick(&mut self) -> Option<Stats> {
        if self.terminal {
            return None;
        }
        let Some(session) = self.session.as_mut() else {
            return None;
        };

        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        if let Err(e) = self.store.save_session(session) {
            let err = QuizError::Storage(e);
            error!("Failed to persist tick: {}", err);
            self.last_error = Some(err.user_message());
        }

        if self.session.as_ref().is_some_and(|s| s.remaining_seconds == 0) {
            info!("Countdown expired");
            return self.finalize("expired");
        }
        None
    }

    fn on_expired(&mut self) -> Option<Stats> {
        if self.terminal {
            return None;
        }
        self.finalize("expired")
    }

    /// Records the answer for the question at the 1-based `index`. First
    /// answer wins; repeated calls and calls on a terminal session are
    /// ignored.
    pub fn record_answer_at(&mut self, index: usize, answer: &str) {
        if self.terminal {
            debug!("Session is terminal, ignoring answer");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(question) = index
            .checked_sub(1)
            .and_then(|i| session.questions.get_mut(i))
        else {
            return;
        };
        if question.is_answered() {
            debug!("Question {} already answered, ignoring", index);
            return;
        }

        question.is_correct = Some(answer == question.correct_answer);
        if let Err(e) = self.store.save_session(session) {
            let err = QuizError::Storage(e);
            error!("Failed to persist answer: {}", err);
            self.last_error = Some(err.user_message());
        }
    }

    /// Answers the question the cursor points at.
    pub fn record_answer(&mut self, answer: &str) {
        self.record_answer_at(self.current, answer);
    }

    /// Moves the cursor by `delta`, clamped to the question range. The
    /// cursor is in-memory only, never persisted.
    pub fn advance(&mut self, delta: i32) {
        let len = self.quiz_len();
        if len == 0 {
            return;
        }
        let target = self.current as i64 + delta as i64;
        self.current = target.clamp(1, len as i64) as usize;
    }

    pub fn go_to(&mut self, index: usize) {
        let len = self.quiz_len();
        if len == 0 {
            return;
        }
        self.current = index.clamp(1, len);
    }

    /// Ends the session by user action. The persisted copy stays until
    /// `finish` so a reload lands back on the summary.
    pub fn submit(&mut self) -> Option<Stats> {
        if self.terminal {
            return self.session.as_ref().map(QuizSession::stats);
        }
        self.finalize("submitted")
    }

    /// Drops the session from the store and resets the engine. Options and
    /// token survive.
    pub fn finish(&mut self) -> Result<(), QuizError> {
        self.timer.stop();
        self.store.clear_session()?;
        self.session = None;
        self.current = 1;
        self.terminal = false;

        Ok(())
    }

    /// Mandatory cleanup when the presentation layer goes away mid-quiz. A
    /// stray tick after this point cannot touch the store.
    pub fn teardown(&mut self) {
        self.timer.stop();
    }

    pub async fn categories(&self) -> Result<Vec<Category>, QuizError> {
        Ok(self.trivia.fetch_categories(&self.client).await?)
    }

    fn finalize(&mut self, cause: &str) -> Option<Stats> {
        self.timer.stop();
        self.terminal = true;

        let stats = self.session.as_ref().map(QuizSession::stats);
        if let Some(stats) = stats {
            info!(
                "Quiz {}: {} correct of {}",
                cause,
                stats.correct,
                stats.answered + stats.unanswered
            );
        }
        stats
    }

    fn quiz_len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.questions.len())
    }

    pub fn quiz_data(&self) -> &[DisplayQuestion] {
        self.session.as_ref().map_or(&[], |s| &s.questions)
    }

    pub fn current_question(&self) -> Option<&DisplayQuestion> {
        self.session
            .as_ref()
            .and_then(|s| s.questions.get(self.current - 1))
    }

    pub fn stats(&self) -> Stats {
        Stats::from_questions(self.quiz_data())
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.remaining_seconds)
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn has_resumable_session(&self) -> bool {
        self.store.load_session().is_some()
    }

    pub fn get_store(&self) -> &SessionStore {
        &self.store
    }

    pub fn get_tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}
