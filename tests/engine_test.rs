// Full session lifecycle against a fake upstream trivia service.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{Json, Router, extract::Query, extract::State, routing::get};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use trivia_engine::{
    CategoryFilter, Difficulty, QuestionType, QuizEngine, QuizError, QuizOptions,
    config::config::{ApiConfig, AppConfig, StorageConfig},
    store::backend::MemoryBackend,
};

#[derive(Default)]
struct Upstream {
    question_hits: AtomicUsize,
    fixed_code: Option<u8>,
}

async fn token_endpoint(State(_): State<Arc<Upstream>>) -> Json<Value> {
    Json(json!({ "response_code": 0, "token": "tok-1" }))
}

async fn questions_endpoint(
    State(state): State<Arc<Upstream>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.question_hits.fetch_add(1, Ordering::SeqCst);

    if let Some(code) = state.fixed_code {
        return Json(json!({ "response_code": code, "results": [] }));
    }

    let amount: usize = params
        .get("amount")
        .and_then(|a| a.parse().ok())
        .unwrap_or(10);
    let results: Vec<Value> = (0..amount)
        .map(|i| {
            json!({
                "type": "boolean",
                "difficulty": "easy",
                "category": "General Knowledge",
                "question": format!("Statement {} is true?", i),
                "correct_answer": "True",
                "incorrect_answers": ["False"],
            })
        })
        .collect();

    Json(json!({ "response_code": 0, "results": results }))
}

fn setup_logging() {
    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::level_filters::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

async fn start_upstream(upstream: Arc<Upstream>) -> SocketAddr {
    setup_logging();
    let app = Router::new()
        .route("/api_token.php", get(token_endpoint))
        .route("/api.php", get(questions_endpoint))
        .with_state(upstream);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr) -> AppConfig {
    AppConfig {
        api: ApiConfig {
            base_url: format!("http://{}", addr),
            timeout_secs: 5,
        },
        storage: StorageConfig {
            dir: ".unused".into(),
        },
    }
}

fn options(count: u8, timer_seconds: u32) -> QuizOptions {
    QuizOptions {
        category: CategoryFilter::Any,
        difficulty: Difficulty::Easy,
        question_type: QuestionType::Boolean,
        timer_seconds,
        question_count: count,
    }
}

#[tokio::test]
async fn start_new_builds_a_session_with_the_configured_timer() {
    let upstream = Arc::new(Upstream::default());
    let addr = start_upstream(upstream.clone()).await;
    let mut engine =
        QuizEngine::new(&config_for(addr), Arc::new(MemoryBackend::new())).unwrap();

    let _rx = engine.start_new(options(5, 300)).await.unwrap();

    assert_eq!(engine.quiz_data().len(), 5);
    assert_eq!(engine.remaining_seconds(), 300);
    assert_eq!(engine.current_index(), 1);
    assert!(!engine.is_terminal());
    assert!(engine.has_resumable_session());
    assert_eq!(engine.get_store().load_options(), Some(options(5, 300)));

    engine.teardown();
}

#[tokio::test]
async fn reload_resumes_without_a_second_fetch() {
    let upstream = Arc::new(Upstream::default());
    let addr = start_upstream(upstream.clone()).await;
    let backend = Arc::new(MemoryBackend::new());

    let snapshot;
    {
        let mut engine = QuizEngine::new(&config_for(addr), backend.clone()).unwrap();
        let _rx = engine.start_new(options(5, 300)).await.unwrap();
        engine.record_answer("True");
        engine.on_tick();
        snapshot = engine.quiz_data().to_vec();
        // Engine drop is the navigate-away teardown.
    }

    let mut engine = QuizEngine::new(&config_for(addr), backend).unwrap();
    let _rx = engine.resume(options(5, 300)).await.unwrap();

    assert_eq!(engine.quiz_data(), snapshot.as_slice());
    assert_eq!(engine.quiz_data()[0].is_correct, Some(true));
    assert_eq!(engine.remaining_seconds(), 299);
    assert_eq!(upstream.question_hits.load(Ordering::SeqCst), 1);

    engine.teardown();
}

#[tokio::test]
async fn start_new_discards_the_persisted_session() {
    let upstream = Arc::new(Upstream::default());
    let addr = start_upstream(upstream.clone()).await;
    let mut engine =
        QuizEngine::new(&config_for(addr), Arc::new(MemoryBackend::new())).unwrap();

    let _rx = engine.start_new(options(5, 300)).await.unwrap();
    engine.record_answer("True");
    engine.on_tick();

    let _rx = engine.start_new(options(5, 300)).await.unwrap();

    assert_eq!(upstream.question_hits.load(Ordering::SeqCst), 2);
    assert_eq!(engine.remaining_seconds(), 300);
    assert!(engine.quiz_data().iter().all(|q| q.is_correct.is_none()));

    engine.teardown();
}

#[tokio::test]
async fn expiry_mid_quiz_goes_terminal_with_the_right_counts() {
    let upstream = Arc::new(Upstream::default());
    let addr = start_upstream(upstream).await;
    let mut engine =
        QuizEngine::new(&config_for(addr), Arc::new(MemoryBackend::new())).unwrap();

    let _rx = engine.start_new(options(5, 3)).await.unwrap();
    engine.record_answer("True");
    engine.go_to(2);
    engine.record_answer("False");

    assert!(engine.on_tick().is_none());
    assert!(engine.on_tick().is_none());
    let stats = engine.on_tick().expect("expiry yields final stats");

    assert!(engine.is_terminal());
    assert_eq!(stats.answered, 2);
    assert_eq!(stats.correct, 1);
    assert_eq!(stats.incorrect, 1);
    assert_eq!(stats.unanswered, 3);

    engine.go_to(3);
    engine.record_answer("True");
    assert_eq!(engine.stats().answered, 2);

    engine.teardown();
}

#[tokio::test]
async fn timer_events_drive_the_session_to_expiry() {
    let upstream = Arc::new(Upstream::default());
    let addr = start_upstream(upstream).await;
    let mut engine =
        QuizEngine::new(&config_for(addr), Arc::new(MemoryBackend::new())).unwrap();

    let mut rx = engine.start_new(options(2, 2)).await.unwrap();
    engine.record_answer("True");

    let mut final_stats = None;
    while let Some(event) = rx.recv().await {
        if let Some(stats) = engine.handle_timer_event(event) {
            final_stats = Some(stats);
        }
    }

    let stats = final_stats.expect("expiry produced final stats");
    assert!(engine.is_terminal());
    assert_eq!(engine.remaining_seconds(), 0);
    assert_eq!(stats.answered, 1);
    assert_eq!(stats.unanswered, 1);
}

#[tokio::test]
async fn failed_fetch_leaves_a_banner_and_no_session() {
    let upstream = Arc::new(Upstream {
        fixed_code: Some(1),
        ..Default::default()
    });
    let addr = start_upstream(upstream).await;
    let mut engine =
        QuizEngine::new(&config_for(addr), Arc::new(MemoryBackend::new())).unwrap();

    let err = engine.resume(options(5, 300)).await.unwrap_err();

    assert!(matches!(err, QuizError::InsufficientQuestions));
    assert!(engine.last_error().is_some());
    assert!(!engine.is_loading());
    assert!(!engine.has_resumable_session());
    assert!(engine.quiz_data().is_empty());

    engine.clear_error();
    assert!(engine.last_error().is_none());
}

#[tokio::test]
async fn finish_clears_the_slot_and_a_new_quiz_can_start() {
    let upstream = Arc::new(Upstream::default());
    let addr = start_upstream(upstream.clone()).await;
    let mut engine =
        QuizEngine::new(&config_for(addr), Arc::new(MemoryBackend::new())).unwrap();

    let _rx = engine.start_new(options(3, 300)).await.unwrap();
    engine.record_answer("True");
    engine.submit().unwrap();
    assert!(engine.has_resumable_session());

    engine.finish().unwrap();
    assert!(!engine.has_resumable_session());

    let _rx = engine.start_new(options(3, 300)).await.unwrap();
    assert_eq!(upstream.question_hits.load(Ordering::SeqCst), 2);
    assert!(!engine.is_terminal());

    engine.teardown();
}
