//! Alias Resolver
//!
//! Maps a raw actor name to a canonical person:
//! 1. exact match of the canonical alias against normalized `full_name`
//!    → provenance `exact_name`
//! 2. alias table lookup by canonical alias → `alias_manual` or
//!    `alias_official` depending on the alias source kind
//! 3. otherwise unresolved
//!
//! Both lookups are hash-map hits built once per run; there is no fuzzy
//! matching. When several persons share a normalized full name, the lowest
//! `person_id` wins.

use super::canonical::canonical_alias;
use crate::models::{DirectEdge, SourceKind};
use pacct_common::db::{AliasRow, PersonRow};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// How a name was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Direct edge carried an explicit, existing `person_id`
    PersonId,
    ExactName,
    AliasManual,
    AliasOfficial,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonId => "person_id",
            Self::ExactName => "exact_name",
            Self::AliasManual => "alias_manual",
            Self::AliasOfficial => "alias_official",
        }
    }
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub person_id: i64,
    pub person_name: String,
    pub provenance: Provenance,
    /// Canonical alias used when the alias table matched
    pub via_alias: Option<String>,
}

struct AliasTarget {
    person_id: i64,
    official: bool,
}

/// In-memory resolver over the person registry
pub struct AliasResolver {
    persons: HashMap<i64, PersonRow>,
    by_full_name: HashMap<String, i64>,
    by_alias: HashMap<String, AliasTarget>,
}

impl AliasResolver {
    /// Build lookup maps from registry rows
    ///
    /// Aliases pointing at a missing person or carrying an unknown source kind
    /// are skipped with a warning.
    pub fn new(persons: Vec<PersonRow>, aliases: &[AliasRow]) -> Self {
        let mut by_full_name: HashMap<String, i64> = HashMap::new();
        for person in &persons {
            let key = canonical_alias(&person.full_name);
            by_full_name
                .entry(key)
                .and_modify(|id| *id = (*id).min(person.person_id))
                .or_insert(person.person_id);
        }

        let persons: HashMap<i64, PersonRow> =
            persons.into_iter().map(|p| (p.person_id, p)).collect();

        let mut by_alias = HashMap::new();
        for alias in aliases {
            if !persons.contains_key(&alias.person_id) {
                warn!(
                    canonical_alias = %alias.canonical_alias,
                    person_id = alias.person_id,
                    "Alias points at unknown person, skipped"
                );
                continue;
            }
            let official = match SourceKind::parse(&alias.source_kind) {
                Ok(kind) => kind.is_official(),
                Err(e) => {
                    warn!(canonical_alias = %alias.canonical_alias, "{}, skipped", e);
                    continue;
                }
            };
            by_alias.insert(
                canonical_alias(&alias.canonical_alias),
                AliasTarget {
                    person_id: alias.person_id,
                    official,
                },
            );
        }

        Self {
            persons,
            by_full_name,
            by_alias,
        }
    }

    pub fn person(&self, person_id: i64) -> Option<&PersonRow> {
        self.persons.get(&person_id)
    }

    pub fn persons_total(&self) -> usize {
        self.persons.len()
    }

    /// Resolve a free-text name
    pub fn resolve(&self, raw_name: &str) -> Option<Resolution> {
        let key = canonical_alias(raw_name);
        if key.is_empty() {
            return None;
        }

        if let Some(person_id) = self.by_full_name.get(&key) {
            return self.resolution(*person_id, Provenance::ExactName, None);
        }

        let target = self.by_alias.get(&key)?;
        let provenance = if target.official {
            Provenance::AliasOfficial
        } else {
            Provenance::AliasManual
        };
        self.resolution(target.person_id, provenance, Some(key))
    }

    /// Resolve a direct edge: explicit `person_id` first, then the actor label
    pub fn resolve_direct(&self, edge: &DirectEdge) -> Option<Resolution> {
        if let Some(person_id) = edge.person_id {
            if let Some(resolved) = self.resolution(person_id, Provenance::PersonId, None) {
                return Some(resolved);
            }
        }
        self.resolve(&edge.actor_label)
    }

    fn resolution(
        &self,
        person_id: i64,
        provenance: Provenance,
        via_alias: Option<String>,
    ) -> Option<Resolution> {
        self.persons.get(&person_id).map(|person| Resolution {
            person_id,
            person_name: person.full_name.clone(),
            provenance,
            via_alias,
        })
    }
}
