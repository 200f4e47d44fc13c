//! Scoring Engine and Gate/Status Engine
//!
//! - **engine** - per-edge weighted scores aggregated per resolved person
//! - **gate** - ratio → threshold → check → AND-gate → status, shared by every report
//! - **report** - scoring report with coverage metrics over the full cohort

pub mod engine;
pub mod gate;
pub mod report;

pub use engine::{
    normalize, primary_factor, rank_order, AliasUsage, PersonScore, ScoringEngine, ScoringRun,
    ScoringTotals, UnresolvedEdge,
};
pub use gate::{Check, Gate, GateBuilder, GateEvaluation, Ratio, RunStatus};
pub use report::{build_scoring_report, AliasTotals, ScoringReport};
