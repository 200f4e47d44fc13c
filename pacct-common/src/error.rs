//! Storage and configuration errors shared by the pacct crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure; always fatal for the run
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored row violates an invariant the write path guarantees
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },
}
