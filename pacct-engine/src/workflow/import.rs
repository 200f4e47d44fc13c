//! Seed import
//!
//! 1. Validate the whole seed; any violation aborts before the first write
//! 2. Open one transaction
//! 3. Per mapping: load the stored alias, resolve the owning person (lookup
//!    only when a manual mapping meets an official alias), resolve
//!    `source_record_pk`, classify the write with `merge_alias_row`, run the
//!    conditional upsert
//! 4. Commit, or roll back for a dry run
//!
//! The classification is only used for counters. The stored outcome comes
//! from the upsert statement itself, which applies the same rule atomically.

use crate::error::Result;
use crate::identity::{canonical_alias, manual_canonical_key};
use crate::merge::{merge_alias_row, MergeCounters};
use crate::models::AliasRecord;
use crate::scoring::{Check, GateBuilder, RunStatus};
use crate::validators::{validate_seed, SeedMapping};
use pacct_common::db::{aliases, persons, source_records};
use serde::Serialize;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Run every write, then roll back
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub mappings_total: usize,
    pub persons_created: usize,
    pub persons_reused: usize,
    #[serde(flatten)]
    pub merge: MergeCounters,
    pub source_record_pk_explicit: usize,
    pub source_record_pk_resolved: usize,
    pub source_record_pk_missed: usize,
    pub source_record_pk_not_requested: usize,
}

/// Store totals after the import (before rollback for a dry run)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportTotals {
    pub persons_total: i64,
    pub aliases_total: i64,
    pub aliases_manual: i64,
    pub aliases_official: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub status: RunStatus,
    pub dry_run: bool,
    pub schema_version: Option<String>,
    pub counts: ImportCounts,
    pub totals: ImportTotals,
    pub checks: BTreeMap<String, Check>,
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Failed report for a seed that was never written
    pub fn rejected(errors: Vec<String>, dry_run: bool) -> Self {
        Self {
            status: RunStatus::Failed,
            dry_run,
            schema_version: None,
            counts: ImportCounts::default(),
            totals: ImportTotals::default(),
            checks: BTreeMap::new(),
            errors,
        }
    }
}

/// How `source_record_pk` was obtained for one mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceRecordOutcome {
    Explicit(i64),
    Resolved(i64),
    Missed,
    NotRequested,
}

impl SourceRecordOutcome {
    fn pk(&self) -> Option<i64> {
        match self {
            Self::Explicit(pk) | Self::Resolved(pk) => Some(*pk),
            Self::Missed | Self::NotRequested => None,
        }
    }
}

/// Import a raw seed document
///
/// A schema-invalid or empty seed yields a `failed` report and no writes.
/// Storage errors are returned as `Err` and roll the transaction back.
pub async fn import_seed(pool: &SqlitePool, raw: &Value, options: ImportOptions) -> Result<ImportReport> {
    let seed = match validate_seed(raw) {
        Ok(seed) => seed,
        Err(errors) => {
            warn!(violations = errors.len(), "Seed rejected, nothing written");
            return Ok(ImportReport::rejected(errors, options.dry_run));
        }
    };

    if seed.mappings.is_empty() {
        warn!("Seed has no mappings, nothing written");
        return Ok(ImportReport {
            schema_version: Some(seed.schema_version),
            ..ImportReport::rejected(vec!["mappings: empty".to_string()], options.dry_run)
        });
    }

    let mut counts = ImportCounts {
        mappings_total: seed.mappings.len(),
        ..Default::default()
    };

    let mut tx = pool.begin().await?;
    for mapping in &seed.mappings {
        import_mapping(&mut *tx, mapping, &mut counts).await?;
    }
    let totals = load_totals(&mut *tx).await?;

    if options.dry_run {
        tx.rollback().await?;
        info!("Dry run, import rolled back");
    } else {
        tx.commit().await?;
    }

    let mut builder = GateBuilder::default();
    builder.require("source_records_resolved", counts.source_record_pk_missed == 0);
    let evaluation = builder.evaluate(false);

    info!(
        status = evaluation.status.as_str(),
        mappings = counts.mappings_total,
        inserted = counts.merge.aliases_inserted,
        updated = counts.merge.aliases_updated,
        downgrades_prevented = counts.merge.aliases_source_kind_downgrade_prevented,
        "Seed import finished"
    );

    Ok(ImportReport {
        status: evaluation.status,
        dry_run: options.dry_run,
        schema_version: Some(seed.schema_version),
        counts,
        totals,
        checks: evaluation.checks,
        errors: Vec::new(),
    })
}

async fn import_mapping(
    conn: &mut SqliteConnection,
    mapping: &SeedMapping,
    counts: &mut ImportCounts,
) -> Result<()> {
    let existing = match aliases::get_alias(conn, &mapping.canonical_alias).await? {
        Some(row) => Some(AliasRecord::from_row(&row).map_err(|message| {
            pacct_common::Error::CorruptRow {
                table: "person_name_aliases",
                message: format!("{}: {}", row.canonical_alias, message),
            }
        })?),
        None => None,
    };

    // a manual mapping cannot move an official alias, nor create its owner
    let blocked = existing
        .as_ref()
        .is_some_and(|row| row.source_kind.is_official() && !mapping.source_kind.is_official());

    let (person_id, unknown_owner) = match (&existing, blocked) {
        (Some(row), true) => match find_owner(conn, mapping).await? {
            Some(person_id) => {
                counts.persons_reused += 1;
                (person_id, false)
            }
            None => (row.owner, true),
        },
        _ => (resolve_owner(conn, mapping, counts).await?, false),
    };

    let source_record = resolve_source_record(conn, mapping).await?;
    match source_record {
        SourceRecordOutcome::Explicit(_) => counts.source_record_pk_explicit += 1,
        SourceRecordOutcome::Resolved(_) => counts.source_record_pk_resolved += 1,
        SourceRecordOutcome::Missed => {
            counts.source_record_pk_missed += 1;
            warn!(
                alias = %mapping.canonical_alias,
                source_id = mapping.source_id.as_deref().unwrap_or_default(),
                source_record_id = mapping.source_record_id.as_deref().unwrap_or_default(),
                "Source record not found"
            );
        }
        SourceRecordOutcome::NotRequested => counts.source_record_pk_not_requested += 1,
    }

    let mut evidence = mapping.evidence.clone();
    evidence.source_record_pk = source_record.pk();
    let incoming = AliasRecord {
        alias: mapping.actor_person_name.clone(),
        owner: person_id,
        source_kind: mapping.source_kind.clone(),
        evidence,
    };

    let mut outcome = merge_alias_row(existing.as_ref(), &incoming);
    // an owner nobody has registered differs from the stored one by definition
    outcome.retarget_downgrade_prevented |= unknown_owner;
    counts.merge.record(&outcome);
    if outcome.source_kind_downgrade_prevented {
        warn!(
            alias = %mapping.canonical_alias,
            kept_person_id = outcome.record.owner,
            incoming_person = %mapping.person_full_name,
            retarget = outcome.retarget_downgrade_prevented,
            "Downgrade of official alias prevented"
        );
    }

    aliases::upsert_alias(conn, &incoming.to_row(&mapping.canonical_alias)).await?;
    debug!(alias = %mapping.canonical_alias, action = ?outcome.action, "Alias merged");
    Ok(())
}

/// Owner priority: person_id hint → canonical_key hint → exact full name
async fn find_owner(conn: &mut SqliteConnection, mapping: &SeedMapping) -> Result<Option<i64>> {
    if let Some(person_id) = mapping.person_id {
        if persons::get_person(conn, person_id).await?.is_some() {
            return Ok(Some(person_id));
        }
        debug!(person_id, "person_id hint does not resolve");
    }

    if let Some(key) = &mapping.person_canonical_key {
        if let Some(person) = persons::get_person_by_canonical_key(conn, key).await? {
            return Ok(Some(person.person_id));
        }
    }

    let full_name_key = canonical_alias(&mapping.person_full_name);
    Ok(persons::find_person_by_full_name_key(conn, &full_name_key)
        .await?
        .map(|person| person.person_id))
}

/// `find_owner`, falling back to a new person
async fn resolve_owner(
    conn: &mut SqliteConnection,
    mapping: &SeedMapping,
    counts: &mut ImportCounts,
) -> Result<i64> {
    if let Some(person_id) = find_owner(conn, mapping).await? {
        counts.persons_reused += 1;
        return Ok(person_id);
    }

    let canonical_key = mapping
        .person_canonical_key
        .clone()
        .unwrap_or_else(|| manual_canonical_key(&mapping.person_full_name));
    let person_id = persons::insert_person(
        conn,
        &mapping.person_full_name,
        &canonical_alias(&mapping.person_full_name),
        &canonical_key,
    )
    .await?;
    counts.persons_created += 1;
    debug!(person_id, name = %mapping.person_full_name, "Person created");
    Ok(person_id)
}

async fn resolve_source_record(
    conn: &mut SqliteConnection,
    mapping: &SeedMapping,
) -> Result<SourceRecordOutcome> {
    if let Some(pk) = mapping.evidence.source_record_pk {
        return Ok(SourceRecordOutcome::Explicit(pk));
    }

    let (Some(source_id), Some(record_id)) = (&mapping.source_id, &mapping.source_record_id) else {
        return Ok(SourceRecordOutcome::NotRequested);
    };

    Ok(
        match source_records::find_source_record_pk(conn, source_id, record_id).await? {
            Some(pk) => SourceRecordOutcome::Resolved(pk),
            None => SourceRecordOutcome::Missed,
        },
    )
}

async fn load_totals(conn: &mut SqliteConnection) -> Result<ImportTotals> {
    let persons_total = persons::count_persons(conn).await?;
    let (aliases_total, aliases_manual, aliases_official) =
        aliases::count_aliases_by_kind(conn).await?;
    Ok(ImportTotals {
        persons_total,
        aliases_total,
        aliases_manual,
        aliases_official,
    })
}
