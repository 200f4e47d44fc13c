//! # pacct Common Library
//!
//! Shared code for the personal accountability toolchain:
//! - Error type and result alias
//! - Bootstrap configuration (TOML, environment, platform defaults)
//! - SQLite storage: schema initialization, typed rows and plain CRUD
//!
//! Business rules (resolution, merge, scoring) live in `pacct-engine`; the
//! only rule carried here is the conditional alias upsert, which must be a
//! single statement to stay atomic against concurrent imports.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
