//! Direct and indirect responsibility edges

use super::{clean_text, has_text, role_label, UNKNOWN_ACTOR};
use crate::identity::normalize_whitespace;
use chrono::{DateTime, NaiveDate};
use pacct_common::db::{DirectEdgeRow, IndirectEdgeRow};
use serde::{Serialize, Serializer};

/// A date column parsed once: blank, a calendar date, or unparseable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    Empty,
    Date(NaiveDate),
    Malformed(String),
}

impl DateField {
    /// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date part kept)
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::Empty;
        };

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Self::Date(date);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Self::Date(ts.date_naive());
        }

        Self::Malformed(text.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl Serialize for DateField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Date(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            Self::Malformed(text) => serializer.serialize_str(text),
        }
    }
}

/// Evidence attached to an edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub source_url: Option<String>,
    pub evidence_date: DateField,
    pub evidence_quote: Option<String>,
}

impl Evidence {
    pub fn new(
        source_url: Option<&str>,
        evidence_date: Option<&str>,
        evidence_quote: Option<&str>,
    ) -> Self {
        Self {
            source_url: clean_text(source_url),
            evidence_date: DateField::parse(evidence_date),
            evidence_quote: clean_text(evidence_quote),
        }
    }

    /// Primary evidence: url, date and quote all non-empty
    pub fn is_primary(&self) -> bool {
        has_text(&self.source_url) && !self.evidence_date.is_empty() && has_text(&self.evidence_quote)
    }
}

fn actor_label(raw: &str) -> String {
    let label = normalize_whitespace(raw);
    if label.is_empty() {
        UNKNOWN_ACTOR.to_string()
    } else {
        label
    }
}

/// Direct edge: an institutional or personal actor with a role on a fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectEdge {
    pub edge_id: i64,
    pub fragment_id: String,
    /// Normalized role label (`unknown_role` when blank)
    pub role: String,
    /// Whitespace-normalized actor label (`unknown_actor` when blank)
    pub actor_label: String,
    pub person_id: Option<i64>,
    pub evidence: Evidence,
}

impl From<DirectEdgeRow> for DirectEdge {
    fn from(row: DirectEdgeRow) -> Self {
        Self {
            edge_id: row.edge_id,
            fragment_id: row.fragment_id.trim().to_string(),
            role: role_label(&row.role),
            actor_label: actor_label(&row.actor_label),
            person_id: row.person_id,
            evidence: Evidence::new(
                row.source_url.as_deref(),
                row.evidence_date.as_deref(),
                row.evidence_quote.as_deref(),
            ),
        }
    }
}

/// Indirect edge: a named office holder reached through a delegation chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndirectEdge {
    pub edge_id: i64,
    pub fragment_id: String,
    pub role: String,
    pub actor_label: String,
    pub actor_person_name: Option<String>,
    pub actor_role_title: Option<String>,
    pub appointment_start: DateField,
    pub appointment_end: DateField,
    pub causal_distance: i64,
    pub edge_confidence: f64,
    pub evidence: Evidence,
}

impl From<IndirectEdgeRow> for IndirectEdge {
    fn from(row: IndirectEdgeRow) -> Self {
        Self {
            edge_id: row.edge_id,
            fragment_id: row.fragment_id.trim().to_string(),
            role: role_label(&row.role),
            actor_label: actor_label(&row.actor_label),
            actor_person_name: clean_text(row.actor_person_name.as_deref())
                .map(|name| normalize_whitespace(&name)),
            actor_role_title: clean_text(row.actor_role_title.as_deref()),
            appointment_start: DateField::parse(row.appointment_start_date.as_deref()),
            appointment_end: DateField::parse(row.appointment_end_date.as_deref()),
            causal_distance: row.causal_distance,
            edge_confidence: row.edge_confidence,
            evidence: Evidence::new(
                row.source_url.as_deref(),
                row.evidence_date.as_deref(),
                row.evidence_quote.as_deref(),
            ),
        }
    }
}
