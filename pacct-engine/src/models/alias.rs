//! Alias records with provenance
//!
//! `AliasRecord<P>` is generic over the owner reference: store rows own a
//! `person_id`, seed mappings own a person description. The merge engine
//! runs on both.

use super::{clean_text, has_text, SourceKind};
use pacct_common::db::AliasRow;
use serde::{Deserialize, Serialize};

/// Non-identity evidence fields of an alias
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasEvidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_record_pk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AliasEvidence {
    /// url, date and quote all present
    pub fn has_primary(&self) -> bool {
        self.missing_primary_fields().is_empty()
    }

    /// Names of the primary evidence fields that are blank
    pub fn missing_primary_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !has_text(&self.source_url) {
            missing.push("source_url");
        }
        if !has_text(&self.evidence_date) {
            missing.push("evidence_date");
        }
        if !has_text(&self.evidence_quote) {
            missing.push("evidence_quote");
        }
        missing
    }

    /// Field-wise `self ?? fallback`
    pub fn or(&self, fallback: &AliasEvidence) -> AliasEvidence {
        fn text(primary: &Option<String>, fallback: &Option<String>) -> Option<String> {
            if has_text(primary) {
                primary.clone()
            } else {
                clean_text(fallback.as_deref())
            }
        }

        AliasEvidence {
            source_url: text(&self.source_url, &fallback.source_url),
            evidence_date: text(&self.evidence_date, &fallback.evidence_date),
            evidence_quote: text(&self.evidence_quote, &fallback.evidence_quote),
            source_record_pk: self.source_record_pk.or(fallback.source_record_pk),
            confidence: self.confidence.or(fallback.confidence),
            note: text(&self.note, &fallback.note),
        }
    }
}

/// Alias text, owner and provenance plus evidence
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRecord<P> {
    pub alias: String,
    pub owner: P,
    pub source_kind: SourceKind,
    pub evidence: AliasEvidence,
}

impl AliasRecord<i64> {
    /// Parse a store row; fails only on an unrecognized `source_kind`
    pub fn from_row(row: &AliasRow) -> Result<Self, String> {
        Ok(Self {
            alias: row.alias.clone(),
            owner: row.person_id,
            source_kind: SourceKind::parse(&row.source_kind)?,
            evidence: AliasEvidence {
                source_url: clean_text(row.source_url.as_deref()),
                evidence_date: clean_text(row.evidence_date.as_deref()),
                evidence_quote: clean_text(row.evidence_quote.as_deref()),
                source_record_pk: row.source_record_pk,
                confidence: row.confidence,
                note: clean_text(row.note.as_deref()),
            },
        })
    }

    pub fn to_row(&self, canonical_alias: &str) -> AliasRow {
        AliasRow {
            canonical_alias: canonical_alias.to_string(),
            alias: self.alias.clone(),
            person_id: self.owner,
            source_kind: self.source_kind.as_str().to_string(),
            source_url: self.evidence.source_url.clone(),
            evidence_date: self.evidence.evidence_date.clone(),
            evidence_quote: self.evidence.evidence_quote.clone(),
            source_record_pk: self.evidence.source_record_pk,
            confidence: self.evidence.confidence,
            note: self.evidence.note.clone(),
        }
    }
}
