use std::env;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub drafts_collection: String,
    pub exams_collection: String,
    pub questions_collection: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origin: String,
    pub draft_api_base_url: String,
    pub draft_api_timeout_secs: u64,
    pub autosave_debounce_ms: u64,
    pub autosave_saved_reset_ms: u64,
    pub autosave_error_reset_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "bharat-mock-local".to_string()),
            drafts_collection: env::var("DRAFTS_COLLECTION")
                .unwrap_or_else(|_| "exam_drafts".to_string()),
            exams_collection: env::var("EXAMS_COLLECTION").unwrap_or_else(|_| "exams".to_string()),
            questions_collection: env::var("QUESTIONS_COLLECTION")
                .unwrap_or_else(|_| "questions".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parse_env("WEB_SERVER_PORT", 8080),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            draft_api_base_url: env::var("DRAFT_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            draft_api_timeout_secs: parse_env("DRAFT_API_TIMEOUT_SECS", 10),
            autosave_debounce_ms: parse_env("AUTOSAVE_DEBOUNCE_MS", 1000),
            autosave_saved_reset_ms: parse_env("AUTOSAVE_SAVED_RESET_MS", 2000),
            autosave_error_reset_ms: parse_env("AUTOSAVE_ERROR_RESET_MS", 3000),
        }
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn autosave_saved_reset(&self) -> Duration {
        Duration::from_millis(self.autosave_saved_reset_ms)
    }

    pub fn autosave_error_reset(&self) -> Duration {
        Duration::from_millis(self.autosave_error_reset_ms)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.web_server_port == 0 {
            return Err(AppError::ValidationError(
                "WEB_SERVER_PORT must be a non-zero port".to_string(),
            ));
        }

        if self.autosave_debounce_ms == 0 {
            return Err(AppError::ValidationError(
                "AUTOSAVE_DEBOUNCE_MS must be greater than zero".to_string(),
            ));
        }

        if reqwest::Url::parse(&self.draft_api_base_url).is_err() {
            return Err(AppError::ValidationError(format!(
                "DRAFT_API_BASE_URL is not a valid URL: {}",
                self.draft_api_base_url
            )));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "bharat-mock-test".to_string(),
            drafts_collection: "exam_drafts".to_string(),
            exams_collection: "exams".to_string(),
            questions_collection: "questions".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            draft_api_base_url: "http://127.0.0.1:8080".to_string(),
            draft_api_timeout_secs: 5,
            autosave_debounce_ms: 1000,
            autosave_saved_reset_ms: 2000,
            autosave_error_reset_ms: 3000,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
