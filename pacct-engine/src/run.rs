//! Store-backed scoring and queue runs
//!
//! Loads one snapshot of persons, aliases, edges and IRLC scores, then runs
//! the pure scoring and backlog code over it. Reads only.

use crate::backlog::{build_review_queue, BacklogCounts, Backlogs, ReviewQueueRow};
use crate::config::ScoringSettings;
use crate::error::Result;
use crate::identity::AliasResolver;
use crate::models::{DirectEdge, IndirectEdge, RoleWeights};
use crate::scoring::{build_scoring_report, GateBuilder, RunStatus, ScoringEngine, ScoringReport, ScoringRun};
use chrono::{DateTime, Utc};
use pacct_common::db::{aliases, edges, persons, AliasRow};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::info;

/// Scoring run plus the registry snapshot it was computed from
pub struct Evaluation {
    pub run: ScoringRun,
    pub resolver: AliasResolver,
    pub aliases: Vec<AliasRow>,
}

impl Evaluation {
    pub fn report(
        &self,
        settings: &ScoringSettings,
        weights: &RoleWeights,
        generated_at: DateTime<Utc>,
    ) -> ScoringReport {
        build_scoring_report(
            &self.run,
            &self.aliases,
            self.resolver.persons_total(),
            settings,
            weights,
            generated_at,
        )
    }

    pub fn backlogs(&self) -> Backlogs {
        Backlogs::build(
            &self.run.unresolved,
            &self.aliases,
            &self.run.alias_usage,
            &self.resolver,
        )
    }
}

/// Load the store and score every edge
pub async fn evaluate_store(
    conn: &mut SqliteConnection,
    settings: &ScoringSettings,
    weights: &RoleWeights,
) -> Result<Evaluation> {
    let person_rows = persons::list_persons(conn).await?;
    let alias_rows = aliases::list_aliases(conn).await?;
    let direct: Vec<DirectEdge> = edges::list_direct_edges(conn)
        .await?
        .into_iter()
        .map(DirectEdge::from)
        .collect();
    let indirect: Vec<IndirectEdge> = edges::list_indirect_edges(conn)
        .await?
        .into_iter()
        .map(IndirectEdge::from)
        .collect();
    let irlc = edges::load_fragment_scores(conn).await?;

    info!(
        persons = person_rows.len(),
        aliases = alias_rows.len(),
        direct = direct.len(),
        indirect = indirect.len(),
        "Store snapshot loaded"
    );

    let resolver = AliasResolver::new(person_rows, &alias_rows);
    let run = ScoringEngine::new(&resolver, weights, settings.filter).score(&direct, &indirect, &irlc);

    Ok(Evaluation {
        run,
        resolver,
        aliases: alias_rows,
    })
}

/// Backlog report printed by the `queue` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueReport {
    pub status: RunStatus,
    pub generated_at: DateTime<Utc>,
    pub counts: BacklogCounts,
    pub queue_rows: usize,
    pub backlogs: Backlogs,
}

/// Backlogs and queue rows of one evaluation
///
/// `failed` when there is nothing to review against (no edges, no aliases),
/// `degraded` while any backlog is non-empty.
pub fn build_queue(evaluation: &Evaluation, generated_at: DateTime<Utc>) -> (QueueReport, Vec<ReviewQueueRow>) {
    let backlogs = evaluation.backlogs();
    let rows = build_review_queue(&backlogs);

    let totals = &evaluation.run.totals;
    let nothing_loaded = totals.direct_edges_total == 0
        && totals.indirect_edges_total == 0
        && evaluation.aliases.is_empty();

    let mut builder = GateBuilder::default();
    builder.require("no_open_gaps", backlogs.is_empty());
    let gate = builder.evaluate(nothing_loaded);

    let report = QueueReport {
        status: gate.status,
        generated_at,
        counts: backlogs.counts(),
        queue_rows: rows.len(),
        backlogs,
    };
    (report, rows)
}
