//! Review queue: backlogs flattened into decision rows
//!
//! The column set matches what `workflow::review` reads back, so a reviewer
//! edits the exported file in place (fills names, evidence and `decision`)
//! and feeds it to `apply-review`.

use super::builders::{
    AliasGap, Backlogs, UnresolvedName, KIND_MANUAL_UPGRADE, KIND_MISSING_EVIDENCE,
    KIND_MISSING_SOURCE_RECORD, KIND_UNRESOLVED_NAME,
};
use pacct_common::db::MANUAL_SEED;
use serde::{Deserialize, Serialize};

pub const DECISION_PENDING: &str = "pending";

/// One reviewable row; every field is plain text or a number so it fits CSV
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueueRow {
    pub kind: String,
    pub key: String,
    pub decision: String,
    pub actor_person_name: String,
    pub person_full_name: Option<String>,
    pub person_id: Option<i64>,
    pub source_kind: Option<String>,
    pub source_url: Option<String>,
    pub evidence_date: Option<String>,
    pub evidence_quote: Option<String>,
    pub source_id: Option<String>,
    pub source_record_id: Option<String>,
    pub source_record_pk: Option<i64>,
    pub confidence: Option<f64>,
    pub note: Option<String>,
    /// `;`-separated blank evidence fields
    pub missing_fields: Option<String>,
    pub edges_total: usize,
    pub impact: f64,
}

/// Flatten every backlog into queue rows, in backlog order
pub fn build_review_queue(backlogs: &Backlogs) -> Vec<ReviewQueueRow> {
    let mut rows = Vec::new();
    rows.extend(backlogs.unresolved_names.iter().map(unresolved_row));
    rows.extend(
        backlogs
            .manual_upgrade_candidates
            .iter()
            .map(|gap| alias_row(KIND_MANUAL_UPGRADE, gap)),
    );
    rows.extend(
        backlogs
            .official_missing_evidence
            .iter()
            .map(|gap| alias_row(KIND_MISSING_EVIDENCE, gap)),
    );
    rows.extend(
        backlogs
            .official_missing_source_record
            .iter()
            .map(|gap| alias_row(KIND_MISSING_SOURCE_RECORD, gap)),
    );
    rows
}

fn unresolved_row(name: &UnresolvedName) -> ReviewQueueRow {
    ReviewQueueRow {
        kind: KIND_UNRESOLVED_NAME.to_string(),
        key: name.key.clone(),
        decision: DECISION_PENDING.to_string(),
        actor_person_name: name
            .name_variants
            .iter()
            .next()
            .cloned()
            .unwrap_or_else(|| name.canonical_alias.clone()),
        source_kind: Some(MANUAL_SEED.to_string()),
        note: name
            .role_titles
            .iter()
            .next()
            .map(|title| format!("role title: {}", title)),
        edges_total: name.edges_total,
        impact: name.potential_weighted_score,
        ..Default::default()
    }
}

fn alias_row(kind: &str, gap: &AliasGap) -> ReviewQueueRow {
    // upgrades need a reviewer-supplied official kind
    let source_kind = if kind == KIND_MANUAL_UPGRADE {
        None
    } else {
        Some(gap.source_kind.clone())
    };

    ReviewQueueRow {
        kind: kind.to_string(),
        key: gap.key.clone(),
        decision: DECISION_PENDING.to_string(),
        actor_person_name: gap.alias.clone(),
        person_full_name: gap.person_full_name.clone(),
        person_id: Some(gap.person_id),
        source_kind,
        source_url: gap.evidence.source_url.clone(),
        evidence_date: gap.evidence.evidence_date.clone(),
        evidence_quote: gap.evidence.evidence_quote.clone(),
        source_record_pk: gap.evidence.source_record_pk,
        confidence: gap.evidence.confidence,
        note: gap.evidence.note.clone(),
        missing_fields: (!gap.missing_fields.is_empty()).then(|| gap.missing_fields.join(";")),
        edges_total: gap.scored_edges,
        impact: gap.weighted_score,
        ..Default::default()
    }
}
