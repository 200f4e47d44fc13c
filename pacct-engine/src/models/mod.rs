//! Typed records parsed once at the input boundary
//!
//! Storage rows and seed/review documents carry loose text; everything past
//! this layer works on these validated types.

pub mod alias;
pub mod edges;
pub mod role;
pub mod source_kind;

pub use alias::{AliasEvidence, AliasRecord};
pub use edges::{DateField, DirectEdge, Evidence, IndirectEdge};
pub use role::{role_label, Role, RoleWeights, UNKNOWN_ACTOR, UNKNOWN_ROLE};
pub use source_kind::SourceKind;

/// `Some(trimmed)` for non-blank text
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}
