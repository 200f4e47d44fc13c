//! Personal responsibility scoring
//!
//! Per scored edge:
//!
//! ```text
//! primary_factor = 1.0 if url ∧ date ∧ quote else 0.5
//! weighted_score = irlc(fragment) × role_weight × edge_confidence × primary_factor
//! ```
//!
//! Direct edges carry confidence 1.0. Indirect edges must be eligible (see
//! `validators::window`) and pass the caller's `IndirectFilter`. Edges whose
//! role weighs zero are not scored but still count toward fragment coverage.
//!
//! Scores aggregate per resolved person name and are normalized against the
//! cohort maximum, so they are only comparable within one run.

use crate::identity::{canonical_alias, AliasResolver, Provenance, Resolution};
use crate::models::{DirectEdge, Evidence, IndirectEdge, RoleWeights};
use crate::validators::{eligibility, IndirectFilter};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Factor applied to edges lacking primary evidence
pub const SECONDARY_EVIDENCE_FACTOR: f64 = 0.5;

/// Aggregated score for one person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonScore {
    pub person_name: String,
    pub person_ids: BTreeSet<i64>,
    pub actor_labels: BTreeSet<String>,
    pub role_titles: BTreeSet<String>,
    pub edges_total: usize,
    pub direct_edges_total: usize,
    pub indirect_edges_total: usize,
    pub fragments_total: usize,
    pub primary_evidence_edges: usize,
    pub primary_evidence_pct: f64,
    pub weighted_score_raw: f64,
    pub responsibility_score_personal: f64,
    pub role_breakdown: BTreeMap<String, usize>,
    pub resolution_breakdown: BTreeMap<String, usize>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Eligible, filtered indirect edge whose person name did not resolve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedEdge {
    pub edge_id: i64,
    pub fragment_id: String,
    pub actor_person_name: String,
    pub canonical_alias: String,
    pub actor_role_title: Option<String>,
    pub role: String,
    pub evidence_date: Option<NaiveDate>,
    /// Weighted score the edge would contribute once resolved
    pub potential_weighted_score: f64,
}

/// Scored edges that resolved through one alias
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AliasUsage {
    pub scored_edges: usize,
    pub weighted_score: f64,
}

/// Run-level counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringTotals {
    pub direct_edges_total: usize,
    pub direct_edges_zero_weight: usize,
    pub direct_edges_unresolved: usize,
    pub indirect_edges_total: usize,
    pub indirect_edges_eligible: usize,
    pub indirect_edges_ineligible: usize,
    pub indirect_ineligible_reasons: BTreeMap<String, usize>,
    pub indirect_edges_filtered_out: usize,
    pub indirect_edges_considered: usize,
    pub indirect_edges_resolved: usize,
    pub indirect_edges_unresolved: usize,
    pub indirect_edges_zero_weight: usize,
    /// Scorable edges (non-zero weight, eligible and filtered for indirect)
    pub edges_scorable_total: usize,
    /// Scorable edges attributed to a person
    pub edges_scored_total: usize,
    pub edges_scored_primary: usize,
    pub edges_missing_irlc: usize,
    pub edges_resolved_via_alias: usize,
    pub edges_resolved_via_official_alias: usize,
    pub edges_resolved_via_manual_alias: usize,
    pub fragments_with_edges: usize,
    pub fragments_with_personal_accountability: usize,
    pub persons_scored_total: usize,
}

/// Full result of a scoring run; `persons` is the complete sorted cohort
#[derive(Debug, Clone, Default)]
pub struct ScoringRun {
    pub persons: Vec<PersonScore>,
    pub totals: ScoringTotals,
    pub unresolved: Vec<UnresolvedEdge>,
    pub alias_usage: BTreeMap<String, AliasUsage>,
}

impl ScoringRun {
    /// The first `top_n` persons; never used for coverage
    pub fn top(&self, top_n: usize) -> &[PersonScore] {
        &self.persons[..top_n.min(self.persons.len())]
    }

    pub fn cohort_empty(&self) -> bool {
        self.totals.edges_scorable_total == 0
    }
}

/// Edge fields the aggregation needs, independent of edge kind
struct EdgeContribution<'e> {
    fragment_id: &'e str,
    role: &'e str,
    actor_label: &'e str,
    role_title: Option<&'e str>,
    direct: bool,
    primary: bool,
    evidence_date: Option<NaiveDate>,
    weighted_score: f64,
}

#[derive(Default)]
struct PersonAccumulator {
    person_ids: BTreeSet<i64>,
    actor_labels: BTreeSet<String>,
    role_titles: BTreeSet<String>,
    direct: usize,
    indirect: usize,
    fragments: BTreeSet<String>,
    primary: usize,
    weighted: f64,
    role_breakdown: BTreeMap<String, usize>,
    resolution_breakdown: BTreeMap<String, usize>,
    period_start: Option<NaiveDate>,
    period_end: Option<NaiveDate>,
}

impl PersonAccumulator {
    fn add(&mut self, resolved: &Resolution, edge: &EdgeContribution<'_>) {
        self.person_ids.insert(resolved.person_id);
        self.actor_labels.insert(edge.actor_label.to_string());
        if let Some(title) = edge.role_title {
            self.role_titles.insert(title.to_string());
        }
        if edge.direct {
            self.direct += 1;
        } else {
            self.indirect += 1;
        }
        self.fragments.insert(edge.fragment_id.to_string());
        if edge.primary {
            self.primary += 1;
        }
        self.weighted += edge.weighted_score;
        *self.role_breakdown.entry(edge.role.to_string()).or_default() += 1;
        *self
            .resolution_breakdown
            .entry(resolved.provenance.as_str().to_string())
            .or_default() += 1;

        if let Some(date) = edge.evidence_date {
            self.period_start = Some(self.period_start.map_or(date, |d| d.min(date)));
            self.period_end = Some(self.period_end.map_or(date, |d| d.max(date)));
        }
    }

    fn finish(self, person_name: String) -> PersonScore {
        let edges_total = self.direct + self.indirect;
        PersonScore {
            person_name,
            person_ids: self.person_ids,
            actor_labels: self.actor_labels,
            role_titles: self.role_titles,
            edges_total,
            direct_edges_total: self.direct,
            indirect_edges_total: self.indirect,
            fragments_total: self.fragments.len(),
            primary_evidence_edges: self.primary,
            primary_evidence_pct: if edges_total == 0 {
                0.0
            } else {
                self.primary as f64 / edges_total as f64
            },
            weighted_score_raw: self.weighted,
            responsibility_score_personal: 0.0,
            role_breakdown: self.role_breakdown,
            resolution_breakdown: self.resolution_breakdown,
            period_start: self.period_start,
            period_end: self.period_end,
        }
    }
}

/// Mutable state of one scoring pass
#[derive(Default)]
struct Aggregation {
    totals: ScoringTotals,
    persons: BTreeMap<String, PersonAccumulator>,
    alias_usage: BTreeMap<String, AliasUsage>,
    unresolved: Vec<UnresolvedEdge>,
    fragments_any: HashSet<String>,
    fragments_personal: HashSet<String>,
}

impl Aggregation {
    fn attribute(&mut self, resolved: &Resolution, edge: EdgeContribution<'_>) {
        let totals = &mut self.totals;
        totals.edges_scored_total += 1;
        if edge.primary {
            totals.edges_scored_primary += 1;
        }
        match resolved.provenance {
            Provenance::AliasOfficial => {
                totals.edges_resolved_via_alias += 1;
                totals.edges_resolved_via_official_alias += 1;
            }
            Provenance::AliasManual => {
                totals.edges_resolved_via_alias += 1;
                totals.edges_resolved_via_manual_alias += 1;
            }
            Provenance::PersonId | Provenance::ExactName => {}
        }
        if let Some(alias) = &resolved.via_alias {
            let usage = self.alias_usage.entry(alias.clone()).or_default();
            usage.scored_edges += 1;
            usage.weighted_score += edge.weighted_score;
        }
        self.fragments_personal.insert(edge.fragment_id.to_string());
        self.persons
            .entry(resolved.person_name.clone())
            .or_default()
            .add(resolved, &edge);
    }

    fn finish(mut self) -> ScoringRun {
        self.totals.fragments_with_edges = self.fragments_any.len();
        self.totals.fragments_with_personal_accountability = self.fragments_personal.len();

        let mut scores: Vec<PersonScore> = self
            .persons
            .into_iter()
            .map(|(name, acc)| acc.finish(name))
            .collect();
        normalize(&mut scores);
        scores.sort_by(rank_order);
        self.totals.persons_scored_total = scores.len();

        ScoringRun {
            persons: scores,
            totals: self.totals,
            unresolved: self.unresolved,
            alias_usage: self.alias_usage,
        }
    }
}

/// Scoring engine over one resolver snapshot
pub struct ScoringEngine<'a> {
    resolver: &'a AliasResolver,
    weights: &'a RoleWeights,
    filter: IndirectFilter,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(resolver: &'a AliasResolver, weights: &'a RoleWeights, filter: IndirectFilter) -> Self {
        Self {
            resolver,
            weights,
            filter,
        }
    }

    /// Score every edge and aggregate per person
    ///
    /// Fragments missing from `irlc` score 0.0.
    pub fn score(
        &self,
        direct: &[DirectEdge],
        indirect: &[IndirectEdge],
        irlc: &HashMap<String, f64>,
    ) -> ScoringRun {
        let mut agg = Aggregation::default();
        agg.totals.direct_edges_total = direct.len();
        agg.totals.indirect_edges_total = indirect.len();

        for edge in direct {
            self.score_direct(edge, irlc, &mut agg);
        }
        for edge in indirect {
            self.score_indirect(edge, irlc, &mut agg);
        }

        agg.finish()
    }

    fn score_direct(&self, edge: &DirectEdge, irlc: &HashMap<String, f64>, agg: &mut Aggregation) {
        agg.fragments_any.insert(edge.fragment_id.clone());

        let weight = self.weights.weight(&edge.role);
        if weight <= 0.0 {
            agg.totals.direct_edges_zero_weight += 1;
            return;
        }
        agg.totals.edges_scorable_total += 1;

        let Some(resolved) = self.resolver.resolve_direct(edge) else {
            agg.totals.direct_edges_unresolved += 1;
            debug!(edge_id = edge.edge_id, actor = %edge.actor_label, "Direct edge unresolved");
            return;
        };

        let weighted_score =
            weighted_score(irlc, &edge.fragment_id, weight, 1.0, &edge.evidence, &mut agg.totals);
        agg.attribute(
            &resolved,
            EdgeContribution {
                fragment_id: &edge.fragment_id,
                role: &edge.role,
                actor_label: &edge.actor_label,
                role_title: None,
                direct: true,
                primary: edge.evidence.is_primary(),
                evidence_date: edge.evidence.evidence_date.date(),
                weighted_score,
            },
        );
    }

    fn score_indirect(&self, edge: &IndirectEdge, irlc: &HashMap<String, f64>, agg: &mut Aggregation) {
        agg.fragments_any.insert(edge.fragment_id.clone());

        let verdict = eligibility(edge);
        if !verdict.is_eligible() {
            agg.totals.indirect_edges_ineligible += 1;
            *agg.totals
                .indirect_ineligible_reasons
                .entry(verdict.as_str().to_string())
                .or_default() += 1;
            return;
        }
        agg.totals.indirect_edges_eligible += 1;

        if !self.filter.passes(edge) {
            agg.totals.indirect_edges_filtered_out += 1;
            return;
        }
        agg.totals.indirect_edges_considered += 1;

        // eligible edges always carry a person name
        let person_name = edge.actor_person_name.as_deref().unwrap_or_default();
        let weight = self.weights.weight(&edge.role);
        let weighted_score = if weight > 0.0 {
            agg.totals.edges_scorable_total += 1;
            weighted_score(
                irlc,
                &edge.fragment_id,
                weight,
                edge.edge_confidence,
                &edge.evidence,
                &mut agg.totals,
            )
        } else {
            agg.totals.indirect_edges_zero_weight += 1;
            0.0
        };

        let Some(resolved) = self.resolver.resolve(person_name) else {
            agg.totals.indirect_edges_unresolved += 1;
            debug!(edge_id = edge.edge_id, name = person_name, "Indirect edge unresolved");
            agg.unresolved.push(UnresolvedEdge {
                edge_id: edge.edge_id,
                fragment_id: edge.fragment_id.clone(),
                actor_person_name: person_name.to_string(),
                canonical_alias: canonical_alias(person_name),
                actor_role_title: edge.actor_role_title.clone(),
                role: edge.role.clone(),
                evidence_date: edge.evidence.evidence_date.date(),
                potential_weighted_score: weighted_score,
            });
            return;
        };
        agg.totals.indirect_edges_resolved += 1;

        if weight > 0.0 {
            agg.attribute(
                &resolved,
                EdgeContribution {
                    fragment_id: &edge.fragment_id,
                    role: &edge.role,
                    actor_label: &edge.actor_label,
                    role_title: edge.actor_role_title.as_deref(),
                    direct: false,
                    primary: edge.evidence.is_primary(),
                    evidence_date: edge.evidence.evidence_date.date(),
                    weighted_score,
                },
            );
        }
    }
}

fn weighted_score(
    irlc: &HashMap<String, f64>,
    fragment_id: &str,
    role_weight: f64,
    edge_confidence: f64,
    evidence: &Evidence,
    totals: &mut ScoringTotals,
) -> f64 {
    let irlc_score = match irlc.get(fragment_id) {
        Some(score) => *score,
        None => {
            totals.edges_missing_irlc += 1;
            0.0
        }
    };
    irlc_score * role_weight * edge_confidence * primary_factor(evidence)
}

/// 1.0 for primary evidence, 0.5 otherwise
pub fn primary_factor(evidence: &Evidence) -> f64 {
    if evidence.is_primary() {
        1.0
    } else {
        SECONDARY_EVIDENCE_FACTOR
    }
}

/// Set `responsibility_score_personal = 100 × raw / max_raw`
///
/// Every person at the maximum gets exactly 100.0; all scores stay 0.0 when
/// no person has a positive raw score.
pub fn normalize(scores: &mut [PersonScore]) {
    let max_raw = scores
        .iter()
        .map(|s| s.weighted_score_raw)
        .fold(0.0_f64, f64::max);

    for score in scores.iter_mut() {
        score.responsibility_score_personal = if max_raw <= 0.0 {
            0.0
        } else if score.weighted_score_raw == max_raw {
            100.0
        } else {
            100.0 * score.weighted_score_raw / max_raw
        };
    }
}

/// Score desc, edges_total desc, person_name asc
pub fn rank_order(a: &PersonScore, b: &PersonScore) -> Ordering {
    b.responsibility_score_personal
        .total_cmp(&a.responsibility_score_personal)
        .then_with(|| b.edges_total.cmp(&a.edges_total))
        .then_with(|| a.person_name.cmp(&b.person_name))
}
