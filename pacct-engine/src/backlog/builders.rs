//! Backlog builders
//!
//! Each builder is a pure function of one scoring run and the alias table.
//! Row keys come from `stable_key`, so the same gap keeps the same key
//! across runs.

use crate::identity::{stable_key, AliasResolver};
use crate::models::AliasRecord;
use crate::scoring::{AliasUsage, UnresolvedEdge};
use chrono::NaiveDate;
use pacct_common::db::AliasRow;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Fragments listed per unresolved name
pub const FRAGMENT_SAMPLE_SIZE: usize = 5;

pub const KIND_UNRESOLVED_NAME: &str = "unresolved_name";
pub const KIND_MANUAL_UPGRADE: &str = "manual_upgrade";
pub const KIND_MISSING_EVIDENCE: &str = "official_missing_evidence";
pub const KIND_MISSING_SOURCE_RECORD: &str = "official_missing_source_record";

/// Unresolved person name, grouped by canonical alias
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedName {
    pub key: String,
    pub canonical_alias: String,
    pub name_variants: BTreeSet<String>,
    pub role_titles: BTreeSet<String>,
    pub edges_total: usize,
    pub fragments_total: usize,
    pub fragment_sample: Vec<String>,
    pub potential_weighted_score: f64,
    pub first_evidence_date: Option<NaiveDate>,
    pub last_evidence_date: Option<NaiveDate>,
}

/// Alias row joined with its owner, shared by the alias backlogs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasGap {
    pub key: String,
    pub canonical_alias: String,
    pub alias: String,
    pub person_id: i64,
    pub person_full_name: Option<String>,
    pub source_kind: String,
    #[serde(flatten)]
    pub evidence: crate::models::AliasEvidence,
    pub scored_edges: usize,
    pub weighted_score: f64,
    /// Blank primary evidence fields (missing-evidence backlog only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<&'static str>,
}

/// All backlogs of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Backlogs {
    pub unresolved_names: Vec<UnresolvedName>,
    pub manual_upgrade_candidates: Vec<AliasGap>,
    pub official_missing_evidence: Vec<AliasGap>,
    pub official_missing_source_record: Vec<AliasGap>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BacklogCounts {
    pub unresolved_names: usize,
    pub unresolved_edges: usize,
    pub manual_upgrade_candidates: usize,
    pub official_missing_evidence: usize,
    pub official_missing_source_record: usize,
}

impl Backlogs {
    pub fn build(
        unresolved: &[UnresolvedEdge],
        aliases: &[AliasRow],
        usage: &BTreeMap<String, AliasUsage>,
        resolver: &AliasResolver,
    ) -> Self {
        let records = parse_aliases(aliases);
        Self {
            unresolved_names: unresolved_names(unresolved),
            manual_upgrade_candidates: manual_upgrade_candidates(&records, usage, resolver),
            official_missing_evidence: official_missing_evidence(&records, usage, resolver),
            official_missing_source_record: official_missing_source_record(&records, usage, resolver),
        }
    }

    pub fn counts(&self) -> BacklogCounts {
        BacklogCounts {
            unresolved_names: self.unresolved_names.len(),
            unresolved_edges: self.unresolved_names.iter().map(|n| n.edges_total).sum(),
            manual_upgrade_candidates: self.manual_upgrade_candidates.len(),
            official_missing_evidence: self.official_missing_evidence.len(),
            official_missing_source_record: self.official_missing_source_record.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unresolved_names.is_empty()
            && self.manual_upgrade_candidates.is_empty()
            && self.official_missing_evidence.is_empty()
            && self.official_missing_source_record.is_empty()
    }
}

/// Group unresolved edges by canonical alias
///
/// Ranked by potential weighted impact desc, edge count desc, canonical asc.
pub fn unresolved_names(unresolved: &[UnresolvedEdge]) -> Vec<UnresolvedName> {
    #[derive(Default)]
    struct Group {
        variants: BTreeSet<String>,
        titles: BTreeSet<String>,
        edges: usize,
        fragments: BTreeSet<String>,
        impact: f64,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    }

    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
    for edge in unresolved {
        let group = groups.entry(edge.canonical_alias.as_str()).or_default();
        group.variants.insert(edge.actor_person_name.clone());
        if let Some(title) = &edge.actor_role_title {
            group.titles.insert(title.clone());
        }
        group.edges += 1;
        group.fragments.insert(edge.fragment_id.clone());
        group.impact += edge.potential_weighted_score;
        if let Some(date) = edge.evidence_date {
            group.first = Some(group.first.map_or(date, |d| d.min(date)));
            group.last = Some(group.last.map_or(date, |d| d.max(date)));
        }
    }

    let mut names: Vec<UnresolvedName> = groups
        .into_iter()
        .map(|(canonical, group)| UnresolvedName {
            key: stable_key(KIND_UNRESOLVED_NAME, &[canonical]),
            canonical_alias: canonical.to_string(),
            name_variants: group.variants,
            role_titles: group.titles,
            edges_total: group.edges,
            fragments_total: group.fragments.len(),
            fragment_sample: group.fragments.into_iter().take(FRAGMENT_SAMPLE_SIZE).collect(),
            potential_weighted_score: group.impact,
            first_evidence_date: group.first,
            last_evidence_date: group.last,
        })
        .collect();

    names.sort_by(|a, b| {
        b.potential_weighted_score
            .total_cmp(&a.potential_weighted_score)
            .then_with(|| b.edges_total.cmp(&a.edges_total))
            .then_with(|| a.canonical_alias.cmp(&b.canonical_alias))
    });
    names
}

/// Manual aliases, most used first
pub fn manual_upgrade_candidates(
    records: &[(String, AliasRecord<i64>)],
    usage: &BTreeMap<String, AliasUsage>,
    resolver: &AliasResolver,
) -> Vec<AliasGap> {
    let mut rows: Vec<AliasGap> = records
        .iter()
        .filter(|(_, record)| !record.source_kind.is_official())
        .map(|(canonical, record)| alias_gap(KIND_MANUAL_UPGRADE, canonical, record, usage, resolver))
        .collect();

    rows.sort_by(|a, b| {
        b.scored_edges
            .cmp(&a.scored_edges)
            .then_with(|| b.weighted_score.total_cmp(&a.weighted_score))
            .then_with(|| a.canonical_alias.cmp(&b.canonical_alias))
    });
    rows
}

/// Official aliases with a blank url, date or quote
pub fn official_missing_evidence(
    records: &[(String, AliasRecord<i64>)],
    usage: &BTreeMap<String, AliasUsage>,
    resolver: &AliasResolver,
) -> Vec<AliasGap> {
    records
        .iter()
        .filter(|(_, record)| record.source_kind.is_official() && !record.evidence.has_primary())
        .map(|(canonical, record)| {
            let mut gap = alias_gap(KIND_MISSING_EVIDENCE, canonical, record, usage, resolver);
            gap.missing_fields = record.evidence.missing_primary_fields();
            gap
        })
        .collect()
}

/// Official aliases without a `source_record_pk`
pub fn official_missing_source_record(
    records: &[(String, AliasRecord<i64>)],
    usage: &BTreeMap<String, AliasUsage>,
    resolver: &AliasResolver,
) -> Vec<AliasGap> {
    records
        .iter()
        .filter(|(_, record)| {
            record.source_kind.is_official() && record.evidence.source_record_pk.is_none()
        })
        .map(|(canonical, record)| {
            alias_gap(KIND_MISSING_SOURCE_RECORD, canonical, record, usage, resolver)
        })
        .collect()
}

/// Parse alias rows, sorted by canonical alias; unparseable rows are skipped
pub fn parse_aliases(aliases: &[AliasRow]) -> Vec<(String, AliasRecord<i64>)> {
    let mut records: Vec<(String, AliasRecord<i64>)> = aliases
        .iter()
        .filter_map(|row| match AliasRecord::from_row(row) {
            Ok(record) => Some((row.canonical_alias.clone(), record)),
            Err(e) => {
                warn!(canonical_alias = %row.canonical_alias, "Skipping alias: {}", e);
                None
            }
        })
        .collect();
    records.sort_by(|a, b| a.0.cmp(&b.0));
    records
}

fn alias_gap(
    kind: &str,
    canonical: &str,
    record: &AliasRecord<i64>,
    usage: &BTreeMap<String, AliasUsage>,
    resolver: &AliasResolver,
) -> AliasGap {
    let used = usage.get(canonical).cloned().unwrap_or_default();
    AliasGap {
        key: stable_key(kind, &[canonical]),
        canonical_alias: canonical.to_string(),
        alias: record.alias.clone(),
        person_id: record.owner,
        person_full_name: resolver.person(record.owner).map(|p| p.full_name.clone()),
        source_kind: record.source_kind.as_str().to_string(),
        evidence: record.evidence.clone(),
        scored_edges: used.scored_edges,
        weighted_score: used.weighted_score,
        missing_fields: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacct_common::db::PersonRow;

    fn unresolved(name: &str, fragment: &str, impact: f64) -> UnresolvedEdge {
        UnresolvedEdge {
            edge_id: 1,
            fragment_id: fragment.to_string(),
            actor_person_name: name.to_string(),
            canonical_alias: crate::identity::canonical_alias(name),
            actor_role_title: Some("Director".to_string()),
            role: "delegate".to_string(),
            evidence_date: NaiveDate::from_ymd_opt(2021, 1, 1),
            potential_weighted_score: impact,
        }
    }

    fn alias(canonical: &str, kind: &str, url: Option<&str>, pk: Option<i64>) -> AliasRow {
        AliasRow {
            canonical_alias: canonical.to_string(),
            alias: canonical.to_uppercase(),
            person_id: 1,
            source_kind: kind.to_string(),
            source_url: url.map(str::to_string),
            evidence_date: url.map(|_| "2020-01-01".to_string()),
            evidence_quote: url.map(|_| "q".to_string()),
            source_record_pk: pk,
            confidence: None,
            note: None,
        }
    }

    fn resolver() -> AliasResolver {
        AliasResolver::new(
            vec![PersonRow {
                person_id: 1,
                full_name: "Ana Pastor".to_string(),
                full_name_key: "ana pastor".to_string(),
                canonical_key: "k1".to_string(),
            }],
            &[],
        )
    }

    #[test]
    fn test_unresolved_grouping_and_rank() {
        let names = unresolved_names(&[
            unresolved("Luis Pérez", "f1", 1.0),
            unresolved("LUIS  pérez", "f2", 1.0),
            unresolved("Marta Díaz", "f3", 5.0),
            unresolved("Aitor Ruiz", "f4", 2.0),
            unresolved("Zoe Gil", "f5", 2.0),
        ]);

        let order: Vec<&str> = names.iter().map(|n| n.canonical_alias.as_str()).collect();
        assert_eq!(order, vec!["marta díaz", "luis pérez", "aitor ruiz", "zoe gil"]);
        assert_eq!(names[1].name_variants.len(), 2);
        assert_eq!(names[1].fragments_total, 2);
        assert_eq!(names[1].key, stable_key(KIND_UNRESOLVED_NAME, &["luis pérez"]));
    }

    #[test]
    fn test_alias_backlogs() {
        let rows = vec![
            alias("ministra", "official_nombramiento", Some("https://boe.es"), Some(4)),
            alias("la ministra", "official_nombramiento", None, None),
            alias("ana", "manual_seed", None, None),
            alias("pastor", "manual_seed", None, None),
        ];
        let mut usage = BTreeMap::new();
        usage.insert(
            "pastor".to_string(),
            AliasUsage {
                scored_edges: 3,
                weighted_score: 1.5,
            },
        );

        let backlogs = Backlogs::build(&[], &rows, &usage, &resolver());

        let manual: Vec<&str> = backlogs
            .manual_upgrade_candidates
            .iter()
            .map(|g| g.canonical_alias.as_str())
            .collect();
        assert_eq!(manual, vec!["pastor", "ana"]);
        assert_eq!(backlogs.manual_upgrade_candidates[0].person_full_name.as_deref(), Some("Ana Pastor"));

        assert_eq!(backlogs.official_missing_evidence.len(), 1);
        assert_eq!(
            backlogs.official_missing_evidence[0].missing_fields,
            vec!["source_url", "evidence_date", "evidence_quote"]
        );
        assert_eq!(backlogs.official_missing_source_record.len(), 1);
        assert_eq!(backlogs.official_missing_source_record[0].canonical_alias, "la ministra");

        let counts = backlogs.counts();
        assert_eq!(counts.manual_upgrade_candidates, 2);
        assert!(!backlogs.is_empty());
    }

    #[test]
    fn test_keys_are_stable_across_runs() {
        let rows = vec![alias("x", "manual_seed", None, None)];
        let a = Backlogs::build(&[], &rows, &BTreeMap::new(), &resolver());
        let b = Backlogs::build(&[], &rows, &BTreeMap::new(), &resolver());
        assert_eq!(a, b);
    }
}
