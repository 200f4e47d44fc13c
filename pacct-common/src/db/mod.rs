//! SQLite storage for persons, aliases, responsibility edges and lookups
//!
//! All query functions take `&mut SqliteConnection` so callers can run them
//! on a pooled connection or inside an open transaction.

pub mod aliases;
pub mod edges;
pub mod init;
pub mod models;
pub mod persons;
pub mod source_records;

pub use init::{init_database, init_schema};
pub use models::{
    AliasRow, DirectEdgeRow, IndirectEdgeRow, PersonRow, SourceRecordRow, MANUAL_SEED,
};

/// Map blank text to NULL at the write boundary
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
