//! Store-mutating workflows
//!
//! - **import** - seed import through the conditional alias upsert
//! - **review** - reviewer decisions merged back into the seed document

pub mod import;
pub mod review;

pub use import::{import_seed, ImportCounts, ImportOptions, ImportReport, ImportTotals};
pub use review::{
    apply_review, load_seed_document, Decision, ReviewApplication, ReviewCounts, ReviewFailure, ReviewReport,
    SourceRecordLookup,
};
