//! Queue/Backlog builders
//!
//! - **builders** - unresolved names, manual upgrade candidates, official
//!   aliases missing evidence or a source-record cross-reference
//! - **queue** - review queue rows written as CSV or JSON

pub mod builders;
pub mod queue;

pub use builders::{
    unresolved_names, AliasGap, BacklogCounts, Backlogs, UnresolvedName, KIND_MANUAL_UPGRADE,
    KIND_MISSING_EVIDENCE, KIND_MISSING_SOURCE_RECORD, KIND_UNRESOLVED_NAME,
};
pub use queue::{build_review_queue, ReviewQueueRow, DECISION_PENDING};
