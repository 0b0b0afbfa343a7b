pub mod error;
pub mod quiz_engine;
