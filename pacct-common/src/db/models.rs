//! Typed storage rows
//!
//! These mirror table columns one-to-one. Text columns that may be blank are
//! `Option<String>`; the engine parses them into validated records.

use serde::{Deserialize, Serialize};

/// Source kind value for unevidenced seed aliases
pub const MANUAL_SEED: &str = "manual_seed";

/// `persons` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonRow {
    pub person_id: i64,
    pub full_name: String,
    pub full_name_key: String,
    pub canonical_key: String,
}

/// `person_name_aliases` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AliasRow {
    pub canonical_alias: String,
    pub alias: String,
    pub person_id: i64,
    pub source_kind: String,
    pub source_url: Option<String>,
    pub evidence_date: Option<String>,
    pub evidence_quote: Option<String>,
    pub source_record_pk: Option<i64>,
    pub confidence: Option<f64>,
    pub note: Option<String>,
}

/// `responsibility_edges` row (direct edge)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct DirectEdgeRow {
    pub edge_id: i64,
    pub fragment_id: String,
    pub role: String,
    pub actor_label: String,
    pub person_id: Option<i64>,
    pub source_url: Option<String>,
    pub evidence_date: Option<String>,
    pub evidence_quote: Option<String>,
}

/// `indirect_responsibility_edges` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndirectEdgeRow {
    pub edge_id: i64,
    pub fragment_id: String,
    pub role: String,
    pub actor_label: String,
    pub actor_person_name: Option<String>,
    pub actor_role_title: Option<String>,
    pub appointment_start_date: Option<String>,
    pub appointment_end_date: Option<String>,
    pub causal_distance: i64,
    pub edge_confidence: f64,
    pub evidence_date: Option<String>,
    pub evidence_quote: Option<String>,
    pub source_url: Option<String>,
}

impl Default for IndirectEdgeRow {
    fn default() -> Self {
        Self {
            edge_id: 0,
            fragment_id: String::new(),
            role: String::new(),
            actor_label: String::new(),
            actor_person_name: None,
            actor_role_title: None,
            appointment_start_date: None,
            appointment_end_date: None,
            causal_distance: 1,
            edge_confidence: 1.0,
            evidence_date: None,
            evidence_quote: None,
            source_url: None,
        }
    }
}

/// `source_records` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceRecordRow {
    pub source_record_pk: i64,
    pub source_id: String,
    pub source_record_id: String,
}
