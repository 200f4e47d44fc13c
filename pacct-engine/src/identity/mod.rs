//! Identity layer: name canonicalization and person resolution
//!
//! Resolution is exact-normalized-string or alias-table lookup only.

pub mod canonical;
pub mod resolver;

pub use canonical::{canonical_alias, manual_canonical_key, normalize_whitespace, stable_key};
pub use resolver::{AliasResolver, Provenance, Resolution};
