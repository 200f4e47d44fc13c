//! Review Applier
//!
//! Feeds reviewer decisions back into the seed document. Approved rows are
//! parsed with the seed mapping parser and merged by canonical alias through
//! `merge_alias_row`, so a review can never downgrade an official mapping
//! either. Bad rows are collected as failures and the batch continues.

use crate::error::{EngineError, Result};
use crate::io::read_json;
use crate::merge::{merge_alias_row, MergeCounters, SeedOwner};
use crate::models::{clean_text, AliasRecord};
use crate::scoring::{Check, GateBuilder, RunStatus};
use crate::validators::{parse_mapping_object, validate_seed, SeedDocument, SeedMapping};
use pacct_common::db::source_records;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reviewer decision on a queue row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Ignore,
    Pending,
}

impl Decision {
    /// Blank or missing means `pending`
    pub fn parse(raw: Option<&Value>) -> std::result::Result<Self, String> {
        let text = match raw {
            None | Some(Value::Null) => return Ok(Self::Pending),
            Some(Value::String(s)) => s.trim().to_lowercase(),
            Some(other) => return Err(format!("decision: expected a string, got {}", other)),
        };
        match text.as_str() {
            "" | "pending" => Ok(Self::Pending),
            "approve" => Ok(Self::Approve),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!(
                "decision: '{}' is not one of approve, ignore, pending",
                other
            )),
        }
    }
}

/// `(source_id, source_record_id)` → `source_record_pk`
#[derive(Debug, Clone, Default)]
pub struct SourceRecordLookup {
    entries: HashMap<(String, String), i64>,
}

impl SourceRecordLookup {
    pub fn insert(&mut self, source_id: &str, source_record_id: &str, pk: i64) {
        self.entries
            .insert((source_id.to_string(), source_record_id.to_string()), pk);
    }

    pub fn get(&self, source_id: &str, source_record_id: &str) -> Option<i64> {
        self.entries
            .get(&(source_id.to_string(), source_record_id.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from file rows; rows lacking any of the three fields are skipped
    pub fn from_rows(rows: &[Map<String, Value>]) -> Self {
        let mut lookup = Self::default();
        for (index, row) in rows.iter().enumerate() {
            let text = |key: &str| match row.get(key) {
                Some(Value::String(s)) => clean_text(Some(s)),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            let pk = text("source_record_pk").and_then(|v| v.parse::<i64>().ok());
            match (text("source_id"), text("source_record_id"), pk) {
                (Some(source_id), Some(record_id), Some(pk)) if pk > 0 => {
                    lookup.insert(&source_id, &record_id, pk)
                }
                _ => warn!(row = index, "Source record lookup row skipped"),
            }
        }
        lookup
    }

    /// Build from the store's `source_records` table
    pub async fn load(conn: &mut SqliteConnection) -> Result<Self> {
        let mut lookup = Self::default();
        for row in source_records::list_source_records(conn).await? {
            lookup.insert(&row.source_id, &row.source_record_id, row.source_record_pk);
        }
        Ok(lookup)
    }
}

/// A decision row that could not be applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewFailure {
    pub row: usize,
    pub key: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewCounts {
    pub rows_total: usize,
    pub approved: usize,
    pub ignored: usize,
    pub pending: usize,
    pub failed: usize,
    #[serde(flatten)]
    pub merge: MergeCounters,
    pub source_record_pk_auto_resolved: usize,
    pub source_record_pk_missed: usize,
    pub mappings_total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pub status: RunStatus,
    pub counts: ReviewCounts,
    pub checks: BTreeMap<String, Check>,
    pub failures: Vec<ReviewFailure>,
    /// Input problems that stopped the review before any row was applied
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ReviewReport {
    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            counts: ReviewCounts::default(),
            checks: BTreeMap::new(),
            failures: Vec::new(),
            errors,
        }
    }
}

/// Read and validate a seed document file
pub fn load_seed_document(path: &Path) -> Result<SeedDocument> {
    let raw = read_json(path)?;
    validate_seed(&raw).map_err(EngineError::InvalidSeed)
}

/// Updated seed plus the application report
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewApplication {
    pub seed: SeedDocument,
    pub report: ReviewReport,
}

/// Apply a decision feed to a validated seed
pub fn apply_review(
    seed: SeedDocument,
    decisions: &[Map<String, Value>],
    lookup: &SourceRecordLookup,
) -> ReviewApplication {
    let SeedDocument {
        schema_version,
        methodology,
        mappings,
    } = seed;

    let mut merged: BTreeMap<String, SeedMapping> = mappings
        .into_iter()
        .map(|m| (m.canonical_alias.clone(), m))
        .collect();

    let mut counts = ReviewCounts {
        rows_total: decisions.len(),
        ..Default::default()
    };
    let mut failures = Vec::new();

    for (index, row) in decisions.iter().enumerate() {
        let key = row.get("key").and_then(Value::as_str).map(str::to_string);
        let label = format!("row[{index}]");

        let decision = match Decision::parse(row.get("decision")) {
            Ok(decision) => decision,
            Err(e) => {
                failures.push(ReviewFailure {
                    row: index,
                    key,
                    errors: vec![format!("{label}.{e}")],
                });
                continue;
            }
        };

        match decision {
            Decision::Pending => {
                counts.pending += 1;
                continue;
            }
            Decision::Ignore => {
                counts.ignored += 1;
                continue;
            }
            Decision::Approve => {}
        }

        let mut mapping = match parse_mapping_object(row, &label) {
            Ok(mapping) => mapping,
            Err(errors) => {
                warn!(row = index, errors = errors.len(), "Approved row rejected");
                failures.push(ReviewFailure {
                    row: index,
                    key,
                    errors,
                });
                continue;
            }
        };
        counts.approved += 1;

        if mapping.evidence.source_record_pk.is_none() {
            if let (Some(source_id), Some(record_id)) = (&mapping.source_id, &mapping.source_record_id) {
                match lookup.get(source_id, record_id) {
                    Some(pk) => {
                        mapping.evidence.source_record_pk = Some(pk);
                        counts.source_record_pk_auto_resolved += 1;
                    }
                    None => {
                        counts.source_record_pk_missed += 1;
                        debug!(row = index, source_id = %source_id, record_id = %record_id, "Source record not found");
                    }
                }
            }
        }

        let canonical = mapping.canonical_alias.clone();
        let existing = merged.get(&canonical).map(seed_record);
        let incoming = seed_record(&mapping);
        let outcome = merge_alias_row(existing.as_ref(), &incoming);
        counts.merge.record(&outcome);

        let previous = merged.remove(&canonical);
        let (primary, fallback) = match (&previous, outcome.source_kind_downgrade_prevented) {
            (Some(previous), true) => (previous, Some(&mapping)),
            (Some(previous), false) => (&mapping, Some(previous)),
            (None, _) => (&mapping, None),
        };
        let source_id = primary
            .source_id
            .clone()
            .or_else(|| fallback.and_then(|m| m.source_id.clone()));
        let source_record_id = primary
            .source_record_id
            .clone()
            .or_else(|| fallback.and_then(|m| m.source_record_id.clone()));

        merged.insert(
            canonical.clone(),
            seed_mapping(canonical, outcome.record, source_id, source_record_id),
        );
    }

    counts.failed = failures.len();
    counts.mappings_total = merged.len();

    let mut builder = GateBuilder::default();
    builder
        .require("no_row_failures", failures.is_empty())
        .require("source_records_resolved", counts.source_record_pk_missed == 0);
    let evaluation = builder.evaluate(counts.rows_total == 0);

    info!(
        status = evaluation.status.as_str(),
        approved = counts.approved,
        failed = counts.failed,
        downgrades_prevented = counts.merge.aliases_source_kind_downgrade_prevented,
        "Review applied"
    );

    ReviewApplication {
        seed: SeedDocument {
            schema_version,
            methodology,
            mappings: merged.into_values().collect(),
        },
        report: ReviewReport {
            status: evaluation.status,
            counts,
            checks: evaluation.checks,
            failures,
            errors: Vec::new(),
        },
    }
}

fn seed_record(mapping: &SeedMapping) -> AliasRecord<SeedOwner> {
    AliasRecord {
        alias: mapping.actor_person_name.clone(),
        owner: SeedOwner {
            person_full_name: mapping.person_full_name.clone(),
            person_id: mapping.person_id,
            person_canonical_key: mapping.person_canonical_key.clone(),
        },
        source_kind: mapping.source_kind.clone(),
        evidence: mapping.evidence.clone(),
    }
}

fn seed_mapping(
    canonical_alias: String,
    record: AliasRecord<SeedOwner>,
    source_id: Option<String>,
    source_record_id: Option<String>,
) -> SeedMapping {
    SeedMapping {
        actor_person_name: record.alias,
        person_full_name: record.owner.person_full_name,
        source_kind: record.source_kind,
        person_id: record.owner.person_id,
        person_canonical_key: record.owner.person_canonical_key,
        source_id,
        source_record_id,
        evidence: record.evidence,
        canonical_alias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn seed() -> SeedDocument {
        validate_seed(&json!({
            "schema_version": "1",
            "methodology": {"source": "BOE"},
            "mappings": [
                {
                    "actor_person_name": "Ministra de Hacienda",
                    "person_full_name": "María Jesús Montero",
                    "source_kind": "official_nombramiento",
                    "source_url": "https://boe.es/a",
                    "evidence_date": "2018-06-07",
                    "evidence_quote": "Vengo en nombrar"
                }
            ]
        }))
        .unwrap()
    }

    fn rows(value: Value) -> Vec<Map<String, Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!(Decision::parse(None), Ok(Decision::Pending));
        assert_eq!(Decision::parse(Some(&json!(" "))), Ok(Decision::Pending));
        assert_eq!(Decision::parse(Some(&json!("APPROVE"))), Ok(Decision::Approve));
        assert!(Decision::parse(Some(&json!("maybe"))).is_err());
        assert!(Decision::parse(Some(&json!(1))).is_err());
    }

    #[test]
    fn test_apply_mixed_feed() {
        let mut lookup = SourceRecordLookup::default();
        lookup.insert("boe", "BOE-A-2020-1", 31);

        let feed = rows(json!([
            {"decision": "approve", "actor_person_name": "Luis Pérez", "person_full_name": "Luis Pérez Gil",
             "source_kind": "manual_seed", "source_id": "boe", "source_record_id": "BOE-A-2020-1"},
            {"decision": "ignore", "actor_person_name": "Nadie"},
            {"decision": "", "actor_person_name": "Pendiente"},
            {"decision": "approve", "actor_person_name": "Marta", "person_full_name": "Marta Díaz",
             "source_kind": "manual_seed", "confidence": "1.7"},
            {"decision": "later", "key": "unresolved_name:1"},
            {"decision": "approve", "actor_person_name": "Ana", "person_full_name": "Ana Gil",
             "source_kind": "manual_seed", "source_id": "boe", "source_record_id": "missing"}
        ]));

        let applied = apply_review(seed(), &feed, &lookup);
        let counts = applied.report.counts;
        assert_eq!(counts.rows_total, 6);
        assert_eq!(counts.approved, 2);
        assert_eq!(counts.ignored, 1);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.failed, 2);
        assert_eq!(counts.source_record_pk_auto_resolved, 1);
        assert_eq!(counts.source_record_pk_missed, 1);
        assert_eq!(counts.merge.aliases_inserted, 2);
        assert_eq!(applied.report.status, RunStatus::Degraded);
        assert_eq!(applied.report.failures[1].key.as_deref(), Some("unresolved_name:1"));

        let names: Vec<&str> = applied
            .seed
            .mappings
            .iter()
            .map(|m| m.canonical_alias.as_str())
            .collect();
        assert_eq!(names, vec!["ana", "luis pérez", "ministra de hacienda"]);
        assert_eq!(applied.seed.mappings[1].evidence.source_record_pk, Some(31));
    }

    #[test]
    fn test_review_cannot_downgrade_official_mapping() {
        let feed = rows(json!([
            {"decision": "approve", "actor_person_name": "ministra de hacienda",
             "person_full_name": "Otra Persona", "source_kind": "manual_seed", "note": "revisar"}
        ]));

        let applied = apply_review(seed(), &feed, &SourceRecordLookup::default());
        let counts = applied.report.counts;
        assert_eq!(counts.merge.aliases_source_kind_downgrade_prevented, 1);
        assert_eq!(counts.merge.aliases_retarget_downgrade_prevented, 1);
        assert_eq!(applied.report.status, RunStatus::Ok);

        let kept = &applied.seed.mappings[0];
        assert_eq!(kept.person_full_name, "María Jesús Montero");
        assert_eq!(kept.actor_person_name, "Ministra de Hacienda");
        assert!(kept.source_kind.is_official());
        assert_eq!(kept.evidence.note.as_deref(), Some("revisar"));
    }

    #[test]
    fn test_empty_feed_fails() {
        let applied = apply_review(seed(), &[], &SourceRecordLookup::default());
        assert_eq!(applied.report.status, RunStatus::Failed);
        assert_eq!(applied.seed.mappings.len(), 1);
    }

    #[test]
    fn test_lookup_from_rows() {
        let lookup = SourceRecordLookup::from_rows(&rows(json!([
            {"source_id": "boe", "source_record_id": "X", "source_record_pk": "4"},
            {"source_id": "boe", "source_record_id": "Y", "source_record_pk": 5},
            {"source_id": "boe", "source_record_id": "Z"}
        ])));
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("boe", "Y"), Some(5));
    }

    #[test]
    fn test_load_seed_document_reports_unreadable_and_invalid_files() {
        let dir = TempDir::new().unwrap();

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "mappings: [").unwrap();
        let errors = load_seed_document(&broken).unwrap_err().into_messages();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("JSON error"));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"mappings": [{"actor_person_name": "J. Pérez"}]}"#).unwrap();
        let errors = load_seed_document(&invalid).unwrap_err().into_messages();
        assert!(errors.iter().any(|e| e.contains("schema_version")));
        assert!(errors.len() > 1);

        let missing = load_seed_document(&dir.path().join("absent.json")).unwrap_err();
        assert!(missing.into_messages()[0].contains("absent.json"));
    }

    #[test]
    fn test_rejected_report_serializes_errors() {
        let report = ReviewReport::rejected(vec!["JSON error: EOF".to_string()]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], json!("failed"));
        assert_eq!(value["errors"], json!(["JSON error: EOF"]));
        assert_eq!(value["counts"]["approved"], json!(0));

        let applied = apply_review(seed(), &[], &SourceRecordLookup::default());
        let value = serde_json::to_value(&applied.report).unwrap();
        assert!(value.get("errors").is_none());
    }
}
