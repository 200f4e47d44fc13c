//! Engine error type
//!
//! Only fatal conditions are errors. Resolution misses, blocked downgrades
//! and per-row validation failures are counted in the run report instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage or configuration failure from pacct-common
    #[error(transparent)]
    Common(#[from] pacct_common::Error),

    /// Transaction control (begin/commit/rollback)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Seed document failed schema validation; every violation is listed
    #[error("Invalid seed document ({} violations)", .0.len())]
    InvalidSeed(Vec<String>),

    /// Unusable input file or argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Messages for a failed report's `errors` list
    pub fn into_messages(self) -> Vec<String> {
        match self {
            Self::InvalidSeed(violations) => violations,
            other => vec![other.to_string()],
        }
    }
}
