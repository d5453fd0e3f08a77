use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level configuration shared by the command-line tools.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let dir = env::var("DASS_STORE_DIR").unwrap_or_else(|_| ".dass".to_string());
        let save_attempts = env::var("DASS_SAVE_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()
            .ok()
            .filter(|&attempts| attempts >= 1)
            .ok_or(ConfigError::InvalidSaveAttempts)?;

        let log_level = env::var("DASS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            store: StoreConfig {
                dir: PathBuf::from(dir),
                save_attempts,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where results and profiles live, and how hard to try when saving.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub save_attempts: u32,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DASS_SAVE_ATTEMPTS must be a positive integer")]
    InvalidSaveAttempts,
}
