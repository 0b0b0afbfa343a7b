use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::load().unwrap_or_else(|e| panic!("Failed to load configuration: {}", e))
});

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl AppConfig {
    /// Defaults overlaid with QUIZ__-prefixed environment variables,
    /// e.g. QUIZ__API__BASE_URL, QUIZ__STORAGE__DIR.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("api.base_url", "https://opentdb.com")?
            .set_default("api.timeout_secs", 10)?
            .set_default("storage.dir", ".trivia-data")?
            .add_source(
                Environment::with_prefix("QUIZ")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
