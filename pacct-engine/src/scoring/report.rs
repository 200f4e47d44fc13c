//! Scoring report assembly
//!
//! Coverage is computed from the full scored cohort and the full alias
//! table; `top_n` only trims `top_person_scores`.

use super::engine::{PersonScore, ScoringRun, ScoringTotals, SECONDARY_EVIDENCE_FACTOR};
use super::gate::{Check, Gate, GateBuilder, Ratio, RunStatus};
use crate::backlog::{builders::parse_aliases, unresolved_names, UnresolvedName};
use crate::config::ScoringSettings;
use crate::models::RoleWeights;
use crate::validators::IndirectFilter;
use chrono::{DateTime, Utc};
use pacct_common::db::AliasRow;
use serde::Serialize;
use std::collections::BTreeMap;

/// Alias table figures feeding the official-alias coverage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AliasTotals {
    pub aliases_total: usize,
    pub aliases_manual: usize,
    pub aliases_official: usize,
    pub official_aliases_with_evidence: usize,
    pub official_aliases_with_source_record: usize,
}

impl AliasTotals {
    pub fn from_rows(aliases: &[AliasRow]) -> Self {
        let mut totals = Self::default();
        for (_, record) in parse_aliases(aliases) {
            totals.aliases_total += 1;
            if !record.source_kind.is_official() {
                totals.aliases_manual += 1;
                continue;
            }
            totals.aliases_official += 1;
            if record.evidence.has_primary() {
                totals.official_aliases_with_evidence += 1;
            }
            if record.evidence.source_record_pk.is_some() {
                totals.official_aliases_with_source_record += 1;
            }
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTotals {
    #[serde(flatten)]
    pub scoring: ScoringTotals,
    #[serde(flatten)]
    pub aliases: AliasTotals,
    pub persons_registry_total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Methodology {
    pub role_weights: BTreeMap<&'static str, f64>,
    pub indirect_filter: IndirectFilter,
    pub primary_evidence_factor: f64,
    pub secondary_evidence_factor: f64,
    pub normalization: &'static str,
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringReport {
    pub status: RunStatus,
    pub generated_at: DateTime<Utc>,
    pub totals: ReportTotals,
    pub coverage: BTreeMap<String, Ratio>,
    pub checks: BTreeMap<String, Check>,
    pub gate: Gate,
    pub methodology: Methodology,
    pub top_person_scores: Vec<PersonScore>,
    pub indirect_identity_unresolved_sample: Vec<UnresolvedName>,
}

/// Compute the scoring coverage ratios into `builder`
pub fn coverage_ratios(builder: &mut GateBuilder, totals: &ScoringTotals, aliases: &AliasTotals) {
    builder
        .ratio(
            "fragment_personal_coverage_pct",
            totals.fragments_with_personal_accountability,
            totals.fragments_with_edges,
        )
        .ratio(
            "primary_evidence_pct",
            totals.edges_scored_primary,
            totals.edges_scored_total,
        )
        .ratio(
            "indirect_identity_resolved_pct",
            totals.indirect_edges_resolved,
            totals.indirect_edges_considered,
        )
        .ratio(
            "official_alias_resolution_pct",
            totals.edges_resolved_via_official_alias,
            totals.edges_resolved_via_alias,
        )
        .ratio(
            "manual_alias_resolution_pct",
            totals.edges_resolved_via_manual_alias,
            totals.edges_resolved_via_alias,
        )
        .ratio(
            "official_alias_evidence_pct",
            aliases.official_aliases_with_evidence,
            aliases.aliases_official,
        )
        .ratio(
            "official_alias_source_record_pct",
            aliases.official_aliases_with_source_record,
            aliases.aliases_official,
        );
}

pub fn build_scoring_report(
    run: &ScoringRun,
    aliases: &[AliasRow],
    persons_registry_total: usize,
    settings: &ScoringSettings,
    weights: &RoleWeights,
    generated_at: DateTime<Utc>,
) -> ScoringReport {
    let alias_totals = AliasTotals::from_rows(aliases);

    let mut builder = GateBuilder::new(settings.thresholds.clone());
    coverage_ratios(&mut builder, &run.totals, &alias_totals);
    let evaluation = builder.evaluate(run.cohort_empty());

    let mut sample = unresolved_names(&run.unresolved);
    sample.truncate(settings.unresolved_sample_size);

    ScoringReport {
        status: evaluation.status,
        generated_at,
        totals: ReportTotals {
            scoring: run.totals.clone(),
            aliases: alias_totals,
            persons_registry_total,
        },
        coverage: evaluation.coverage,
        checks: evaluation.checks,
        gate: evaluation.gate,
        methodology: Methodology {
            role_weights: weights.as_labels(),
            indirect_filter: settings.filter,
            primary_evidence_factor: 1.0,
            secondary_evidence_factor: SECONDARY_EVIDENCE_FACTOR,
            normalization: "cohort_max",
            top_n: settings.top_n,
        },
        top_person_scores: run.top(settings.top_n).to_vec(),
        indirect_identity_unresolved_sample: sample,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(kind: &str, url: bool, pk: Option<i64>) -> AliasRow {
        AliasRow {
            canonical_alias: format!("{kind}-{url}-{pk:?}"),
            alias: "A".to_string(),
            person_id: 1,
            source_kind: kind.to_string(),
            source_url: url.then(|| "https://boe.es".to_string()),
            evidence_date: url.then(|| "2020-01-01".to_string()),
            evidence_quote: url.then(|| "q".to_string()),
            source_record_pk: pk,
            confidence: None,
            note: None,
        }
    }

    #[test]
    fn test_alias_totals() {
        let totals = AliasTotals::from_rows(&[
            alias("official_a", true, Some(1)),
            alias("official_b", false, Some(2)),
            alias("official_c", true, None),
            alias("manual_seed", true, Some(3)),
        ]);
        assert_eq!(totals.aliases_total, 4);
        assert_eq!(totals.aliases_manual, 1);
        assert_eq!(totals.aliases_official, 3);
        assert_eq!(totals.official_aliases_with_evidence, 2);
        assert_eq!(totals.official_aliases_with_source_record, 2);
    }

    #[test]
    fn test_empty_run_fails_with_zero_ratios() {
        let run = ScoringRun::default();
        let settings = ScoringSettings::default();
        let report = build_scoring_report(
            &run,
            &[],
            0,
            &settings,
            &RoleWeights::standard(),
            Utc::now(),
        );

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.coverage.len(), 7);
        assert!(report.coverage.values().all(|r| r.value == 0.0));
        assert!(!report.checks.contains_key("manual_alias_resolution_pct"));
        assert!(report.top_person_scores.is_empty());
    }
}
