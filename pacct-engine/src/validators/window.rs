//! Temporal Window Validator
//!
//! An indirect edge supports personal attribution only when the office holder
//! is named, the office is named, the appointment start is known and the
//! dates are mutually consistent:
//!
//! ```text
//! valid = (end empty OR end >= start)
//!     AND (evidence empty OR evidence >= start)
//!     AND (end empty OR evidence empty OR evidence <= end)
//! ```
//!
//! Failing edges are excluded from personal scoring outright; there is no
//! confidence penalty path.

use crate::models::{DateField, IndirectEdge};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Eligibility verdict for an indirect edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    MissingActorPersonName,
    MissingActorRoleTitle,
    MissingAppointmentStart,
    MalformedDate,
    EndBeforeStart,
    EvidenceBeforeStart,
    EvidenceAfterEnd,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "eligible",
            Self::MissingActorPersonName => "missing_actor_person_name",
            Self::MissingActorRoleTitle => "missing_actor_role_title",
            Self::MissingAppointmentStart => "missing_appointment_start",
            Self::MalformedDate => "malformed_date",
            Self::EndBeforeStart => "end_before_start",
            Self::EvidenceBeforeStart => "evidence_before_start",
            Self::EvidenceAfterEnd => "evidence_after_end",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window consistency for a known start date
pub fn check_window(
    start: NaiveDate,
    end: Option<NaiveDate>,
    evidence: Option<NaiveDate>,
) -> Result<(), Eligibility> {
    if let Some(end) = end {
        if end < start {
            return Err(Eligibility::EndBeforeStart);
        }
    }
    if let Some(evidence) = evidence {
        if evidence < start {
            return Err(Eligibility::EvidenceBeforeStart);
        }
        if let Some(end) = end {
            if evidence > end {
                return Err(Eligibility::EvidenceAfterEnd);
            }
        }
    }
    Ok(())
}

/// Full eligibility check of an indirect edge
pub fn eligibility(edge: &IndirectEdge) -> Eligibility {
    if edge.actor_person_name.is_none() {
        return Eligibility::MissingActorPersonName;
    }
    if edge.actor_role_title.is_none() {
        return Eligibility::MissingActorRoleTitle;
    }

    let start = match &edge.appointment_start {
        DateField::Empty => return Eligibility::MissingAppointmentStart,
        DateField::Malformed(_) => return Eligibility::MalformedDate,
        DateField::Date(date) => *date,
    };

    if edge.appointment_end.is_malformed() || edge.evidence.evidence_date.is_malformed() {
        return Eligibility::MalformedDate;
    }

    match check_window(
        start,
        edge.appointment_end.date(),
        edge.evidence.evidence_date.date(),
    ) {
        Ok(()) => Eligibility::Eligible,
        Err(reason) => reason,
    }
}

/// Caller-supplied filter applied to eligible indirect edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndirectFilter {
    pub confidence_min: f64,
    pub max_causal_distance: i64,
}

impl Default for IndirectFilter {
    fn default() -> Self {
        Self {
            confidence_min: 0.0,
            max_causal_distance: 3,
        }
    }
}

impl IndirectFilter {
    pub fn passes(&self, edge: &IndirectEdge) -> bool {
        edge.edge_confidence >= self.confidence_min
            && edge.causal_distance <= self.max_causal_distance
    }
}
