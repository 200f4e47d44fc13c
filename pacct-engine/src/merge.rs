//! Seed Merge Engine
//!
//! Pure anti-downgrade merge for alias rows. Import never lowers the recorded
//! evidentiary quality of a canonical alias:
//!
//! | stored              | incoming       | identity (owner, alias, kind) | evidence fields        |
//! |---------------------|----------------|-------------------------------|------------------------|
//! | none / manual_seed  | any            | incoming                      | incoming ?? stored     |
//! | official_*          | manual_seed    | stored (blocked, counted)     | stored ?? incoming     |
//! | official_*          | official_*     | incoming                      | incoming ?? stored     |
//!
//! The store applies the same table in one conditional upsert
//! (`pacct_common::db::aliases::upsert_alias`); the review applier applies it
//! to seed mappings.

use crate::identity::canonical_alias;
use crate::models::AliasRecord;
use serde::Serialize;

/// Owner comparison used to detect a retargeting attempt
pub trait OwnerRef: Clone {
    fn same_owner(&self, other: &Self) -> bool;
}

impl OwnerRef for i64 {
    fn same_owner(&self, other: &Self) -> bool {
        self == other
    }
}

/// Person reference carried by a seed mapping
#[derive(Debug, Clone, PartialEq)]
pub struct SeedOwner {
    pub person_full_name: String,
    pub person_id: Option<i64>,
    pub person_canonical_key: Option<String>,
}

impl OwnerRef for SeedOwner {
    fn same_owner(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.person_id, other.person_id) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.person_canonical_key, &other.person_canonical_key) {
            return a == b;
        }
        canonical_alias(&self.person_full_name) == canonical_alias(&other.person_full_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeAction {
    Inserted,
    Updated,
}

/// Result of merging an incoming alias over the stored one
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<P> {
    pub record: AliasRecord<P>,
    pub action: MergeAction,
    /// Stored official kind kept against an incoming `manual_seed`
    pub source_kind_downgrade_prevented: bool,
    /// The blocked write also tried to point the alias at another person
    pub retarget_downgrade_prevented: bool,
}

impl<P> MergeOutcome<P> {
    pub fn downgrade_blocked(&self) -> bool {
        self.source_kind_downgrade_prevented
    }
}

/// True when `incoming` would downgrade an official alias to a manual one
pub fn is_downgrade<P>(existing: &AliasRecord<P>, incoming: &AliasRecord<P>) -> bool {
    existing.source_kind.is_official() && !incoming.source_kind.is_official()
}

/// Merge `incoming` over `existing` (absent when the alias is new)
pub fn merge_alias_row<P: OwnerRef>(
    existing: Option<&AliasRecord<P>>,
    incoming: &AliasRecord<P>,
) -> MergeOutcome<P> {
    let Some(existing) = existing else {
        return MergeOutcome {
            record: AliasRecord {
                evidence: incoming.evidence.or(&Default::default()),
                ..incoming.clone()
            },
            action: MergeAction::Inserted,
            source_kind_downgrade_prevented: false,
            retarget_downgrade_prevented: false,
        };
    };

    if is_downgrade(existing, incoming) {
        return MergeOutcome {
            record: AliasRecord {
                alias: existing.alias.clone(),
                owner: existing.owner.clone(),
                source_kind: existing.source_kind.clone(),
                evidence: existing.evidence.or(&incoming.evidence),
            },
            action: MergeAction::Updated,
            source_kind_downgrade_prevented: true,
            retarget_downgrade_prevented: !existing.owner.same_owner(&incoming.owner),
        };
    }

    MergeOutcome {
        record: AliasRecord {
            alias: incoming.alias.clone(),
            owner: incoming.owner.clone(),
            source_kind: incoming.source_kind.clone(),
            evidence: incoming.evidence.or(&existing.evidence),
        },
        action: MergeAction::Updated,
        source_kind_downgrade_prevented: false,
        retarget_downgrade_prevented: false,
    }
}

/// Merge counters reported by the import and review workflows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounters {
    pub aliases_inserted: usize,
    pub aliases_updated: usize,
    pub aliases_source_kind_downgrade_prevented: usize,
    pub aliases_retarget_downgrade_prevented: usize,
}

impl MergeCounters {
    pub fn record<P>(&mut self, outcome: &MergeOutcome<P>) {
        match outcome.action {
            MergeAction::Inserted => self.aliases_inserted += 1,
            MergeAction::Updated => self.aliases_updated += 1,
        }
        if outcome.source_kind_downgrade_prevented {
            self.aliases_source_kind_downgrade_prevented += 1;
        }
        if outcome.retarget_downgrade_prevented {
            self.aliases_retarget_downgrade_prevented += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AliasEvidence, SourceKind};

    fn official(owner: i64) -> AliasRecord<i64> {
        AliasRecord {
            alias: "X".to_string(),
            owner,
            source_kind: SourceKind::Official("official_nombramiento".to_string()),
            evidence: AliasEvidence {
                source_url: Some("https://boe.es/x".to_string()),
                evidence_date: Some("2019-01-01".to_string()),
                evidence_quote: Some("nombra a X".to_string()),
                ..Default::default()
            },
        }
    }

    fn manual(owner: i64) -> AliasRecord<i64> {
        AliasRecord {
            alias: "x".to_string(),
            owner,
            source_kind: SourceKind::ManualSeed,
            evidence: AliasEvidence::default(),
        }
    }

    #[test]
    fn test_insert_when_absent() {
        let outcome = merge_alias_row(None, &manual(1));
        assert_eq!(outcome.action, MergeAction::Inserted);
        assert_eq!(outcome.record, manual(1));
        assert!(!outcome.downgrade_blocked());
    }

    #[test]
    fn test_manual_then_official_upgrades() {
        let outcome = merge_alias_row(Some(&manual(1)), &official(1));
        assert_eq!(outcome.action, MergeAction::Updated);
        assert_eq!(outcome.record, official(1));
        assert!(!outcome.source_kind_downgrade_prevented);
    }

    #[test]
    fn test_manual_over_manual_overwrites_identity_and_keeps_evidence() {
        let mut stored = manual(1);
        stored.evidence.note = Some("first guess".to_string());
        let outcome = merge_alias_row(Some(&stored), &manual(2));
        assert_eq!(outcome.record.owner, 2);
        assert_eq!(outcome.record.evidence.note.as_deref(), Some("first guess"));
    }

    #[test]
    fn test_official_then_manual_is_blocked() {
        let mut incoming = manual(1);
        incoming.evidence.note = Some("replayed".to_string());
        incoming.evidence.source_url = Some("https://other".to_string());

        let outcome = merge_alias_row(Some(&official(1)), &incoming);
        assert!(outcome.source_kind_downgrade_prevented);
        assert!(!outcome.retarget_downgrade_prevented);
        assert_eq!(outcome.record.owner, 1);
        assert_eq!(outcome.record.alias, "X");
        assert!(outcome.record.source_kind.is_official());
        // filled because it was empty, never replaced
        assert_eq!(outcome.record.evidence.note.as_deref(), Some("replayed"));
        assert_eq!(outcome.record.evidence.source_url.as_deref(), Some("https://boe.es/x"));
    }

    #[test]
    fn test_blocked_retarget_is_counted() {
        let outcome = merge_alias_row(Some(&official(1)), &manual(9));
        assert!(outcome.retarget_downgrade_prevented);
        assert_eq!(outcome.record.owner, 1);

        let mut counters = MergeCounters::default();
        counters.record(&outcome);
        assert_eq!(counters.aliases_updated, 1);
        assert_eq!(counters.aliases_source_kind_downgrade_prevented, 1);
        assert_eq!(counters.aliases_retarget_downgrade_prevented, 1);
    }

    #[test]
    fn test_official_refresh_overwrites() {
        let mut refreshed = official(4);
        refreshed.source_kind = SourceKind::Official("official_cese".to_string());
        refreshed.evidence.source_url = None;
        refreshed.evidence.confidence = Some(0.8);

        let outcome = merge_alias_row(Some(&official(1)), &refreshed);
        assert_eq!(outcome.record.owner, 4);
        assert_eq!(outcome.record.source_kind.as_str(), "official_cese");
        assert_eq!(outcome.record.evidence.source_url.as_deref(), Some("https://boe.es/x"));
        assert_eq!(outcome.record.evidence.confidence, Some(0.8));
    }

    #[test]
    fn test_seed_owner_comparison() {
        let a = SeedOwner {
            person_full_name: "Ana García".to_string(),
            person_id: None,
            person_canonical_key: None,
        };
        let b = SeedOwner {
            person_full_name: " ANA  garcía".to_string(),
            ..a.clone()
        };
        assert!(a.same_owner(&b));

        let with_ids = SeedOwner {
            person_id: Some(3),
            ..a.clone()
        };
        let other_id = SeedOwner {
            person_id: Some(4),
            ..a.clone()
        };
        assert!(!with_ids.same_owner(&other_id));
    }
}
