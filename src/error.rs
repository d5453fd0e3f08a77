use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum Error {
    /// Response set is not 42 entries long.
    #[error("expected {expected} responses, got {actual}")]
    IllegalQuestionCount { expected: usize, actual: usize },

    #[error("answer {0} is outside -1..=3")]
    IllegalAnswer(i64),

    #[error("answer '{0}' is not a number")]
    UnparsableAnswer(String),

    #[error("question index {0} is outside 0..42")]
    QuestionIndex(usize),

    /// Submission attempted with unanswered questions.
    #[error("assessment is incomplete: {missing} question(s) unanswered")]
    NotFulfilled { missing: usize },

    #[error("userId cannot be empty")]
    EmptyUserId,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}
