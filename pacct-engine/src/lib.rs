//! # pacct engine
//!
//! Personal accountability identity resolution and scoring:
//!
//! - **identity** - name canonicalization and alias resolution
//! - **models** - typed edges, aliases, roles and source kinds
//! - **validators** - appointment window checks and seed schema validation
//! - **merge** - anti-downgrade alias merge shared by import and review
//! - **workflow** - seed import and review application
//! - **scoring** - personal scores, coverage gate and run status
//! - **backlog** - unresolved names, alias upgrade backlogs and review queue
//!
//! Storage lives in `pacct-common`; every operation here takes a connection
//! or plain values and runs once per CLI invocation.

pub mod backlog;
pub mod config;
pub mod error;
pub mod identity;
pub mod io;
pub mod merge;
pub mod models;
pub mod run;
pub mod scoring;
pub mod validators;
pub mod workflow;

pub use error::{EngineError, Result};
