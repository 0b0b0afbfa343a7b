pub mod auth;
pub mod client;
pub mod config;
pub mod engine;
pub mod quiz;
pub mod store;
pub mod timer;
pub mod token;

pub use engine::error::QuizError;
pub use engine::quiz_engine::QuizEngine;
pub use quiz::models::{
    CategoryFilter, Difficulty, DisplayQuestion, QuestionType, QuizOptions, QuizSession, Stats,
};
pub use timer::countdown::{TimerEvent, TimerState};
