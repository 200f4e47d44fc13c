//! Responsibility roles and their fixed weights
//!
//! Weights are part of the methodology and not operator-configurable. A
//! `RoleWeights` value is built per run and passed to the scoring engine, so
//! tests can score against another table without touching shared state.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Aggregation key for edges with a blank role
pub const UNKNOWN_ROLE: &str = "unknown_role";

/// Aggregation key for edges with a blank actor label
pub const UNKNOWN_ACTOR: &str = "unknown_actor";

/// Scored responsibility roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Propose,
    Approve,
    Delegate,
    Enforce,
    Audit,
    Appoint,
    Instruct,
    Design,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Propose,
        Role::Approve,
        Role::Delegate,
        Role::Enforce,
        Role::Audit,
        Role::Appoint,
        Role::Instruct,
        Role::Design,
    ];

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "propose" => Some(Self::Propose),
            "approve" => Some(Self::Approve),
            "delegate" => Some(Self::Delegate),
            "enforce" => Some(Self::Enforce),
            "audit" => Some(Self::Audit),
            "appoint" => Some(Self::Appoint),
            "instruct" => Some(Self::Instruct),
            "design" => Some(Self::Design),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propose => "propose",
            Self::Approve => "approve",
            Self::Delegate => "delegate",
            Self::Enforce => "enforce",
            Self::Audit => "audit",
            Self::Appoint => "appoint",
            Self::Instruct => "instruct",
            Self::Design => "design",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized role aggregation key (`unknown_role` when blank)
pub fn role_label(raw: &str) -> String {
    let label = raw.trim().to_lowercase();
    if label.is_empty() {
        UNKNOWN_ROLE.to_string()
    } else {
        label
    }
}

/// Immutable role → weight table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleWeights {
    weights: BTreeMap<Role, f64>,
}

impl RoleWeights {
    /// Methodology weights
    pub fn standard() -> Self {
        Self::from_pairs([
            (Role::Approve, 1.0),
            (Role::Propose, 0.9),
            (Role::Design, 0.8),
            (Role::Delegate, 0.7),
            (Role::Instruct, 0.7),
            (Role::Appoint, 0.6),
            (Role::Enforce, 0.5),
            (Role::Audit, 0.3),
        ])
    }

    /// Build a table from explicit pairs; unlisted roles weigh 0.0
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Role, f64)>) -> Self {
        Self {
            weights: pairs.into_iter().map(|(r, w)| (r, w.max(0.0))).collect(),
        }
    }

    /// Weight for a raw role label; unknown or blank roles weigh 0.0
    pub fn weight(&self, label: &str) -> f64 {
        Role::parse(label)
            .and_then(|role| self.weights.get(&role).copied())
            .unwrap_or(0.0)
    }

    /// `role → weight` map keyed by label, for the methodology block
    pub fn as_labels(&self) -> BTreeMap<&'static str, f64> {
        self.weights.iter().map(|(r, w)| (r.as_str(), *w)).collect()
    }
}
