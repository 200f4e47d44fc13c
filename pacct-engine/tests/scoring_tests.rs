//! Scoring over a populated store: normalization, coverage gate, windows

mod helpers;

use chrono::Utc;
use helpers::{
    add_direct_edge, add_indirect_edge, add_person, add_source_record, create_test_db,
    indirect_row, official_mapping, seed, set_irlc,
};
use pacct_engine::config::ScoringSettings;
use pacct_engine::models::RoleWeights;
use pacct_engine::run::{evaluate_store, Evaluation};
use pacct_engine::scoring::RunStatus;
use pacct_engine::workflow::{import_seed, ImportOptions};
use serde_json::json;
use sqlx::SqlitePool;

async fn evaluate(pool: &SqlitePool, settings: &ScoringSettings) -> Evaluation {
    let mut conn = pool.acquire().await.unwrap();
    evaluate_store(&mut *conn, settings, &RoleWeights::standard())
        .await
        .unwrap()
}

/// Ana scored through a direct edge, Juan through an official alias
async fn populate_full_coverage(pool: &SqlitePool) {
    let ana = add_person(pool, "Ana Ruiz").await.unwrap();
    add_direct_edge(pool, "frag-1", "approve", Some(ana), "Ana Ruiz", true)
        .await
        .unwrap();
    set_irlc(pool, "frag-1", 0.8).await.unwrap();

    add_source_record(pool, "boe", "BOE-A-2018-1").await.unwrap();
    let mut mapping = official_mapping("J. Pérez", "Juan Pérez");
    mapping["source_id"] = json!("boe");
    mapping["source_record_id"] = json!("BOE-A-2018-1");
    let imported = import_seed(pool, &seed(vec![mapping]), ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(imported.status, RunStatus::Ok);

    add_indirect_edge(pool, &indirect_row("frag-2", "approve", "J. Pérez", "2019-05-01"))
        .await
        .unwrap();
    set_irlc(pool, "frag-2", 0.5).await.unwrap();
}

#[tokio::test]
async fn test_full_coverage_run_is_ok() {
    let (_dir, pool) = create_test_db().await.unwrap();
    populate_full_coverage(&pool).await;

    let settings = ScoringSettings::default();
    let evaluation = evaluate(&pool, &settings).await;
    let report = evaluation.report(&settings, &RoleWeights::standard(), Utc::now());

    assert_eq!(report.status, RunStatus::Ok);
    assert!(report.gate.passed);
    assert_eq!(report.coverage["fragment_personal_coverage_pct"].value, 1.0);
    assert_eq!(report.coverage["indirect_identity_resolved_pct"].value, 1.0);
    assert_eq!(report.coverage["official_alias_resolution_pct"].value, 1.0);
    assert_eq!(report.totals.scoring.edges_resolved_via_official_alias, 1);

    let top = &report.top_person_scores;
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].person_name, "Ana Ruiz");
    assert_eq!(top[0].responsibility_score_personal, 100.0);
    assert!((top[1].responsibility_score_personal - 62.5).abs() < 1e-9);
    assert_eq!(top[1].resolution_breakdown.get("alias_official"), Some(&1));
}

#[tokio::test]
async fn test_top_n_does_not_change_totals() {
    let (_dir, pool) = create_test_db().await.unwrap();
    populate_full_coverage(&pool).await;

    let settings = ScoringSettings {
        top_n: 1,
        ..Default::default()
    };
    let evaluation = evaluate(&pool, &settings).await;
    let report = evaluation.report(&settings, &RoleWeights::standard(), Utc::now());

    assert_eq!(report.top_person_scores.len(), 1);
    assert_eq!(report.totals.scoring.persons_scored_total, 2);
    assert_eq!(report.methodology.top_n, 1);
}

#[tokio::test]
async fn test_empty_store_fails() {
    let (_dir, pool) = create_test_db().await.unwrap();
    let settings = ScoringSettings::default();
    let report = evaluate(&pool, &settings)
        .await
        .report(&settings, &RoleWeights::standard(), Utc::now());

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.top_person_scores.is_empty());
    assert_eq!(report.coverage["primary_evidence_pct"].value, 0.0);
}

#[tokio::test]
async fn test_adding_exact_person_resolves_edge() {
    let (_dir, pool) = create_test_db().await.unwrap();
    add_indirect_edge(&pool, &indirect_row("frag-1", "approve", "Miguel García", "2019-05-01"))
        .await
        .unwrap();
    set_irlc(&pool, "frag-1", 1.0).await.unwrap();

    let settings = ScoringSettings::default();
    let before = evaluate(&pool, &settings).await;
    assert_eq!(before.run.totals.indirect_edges_resolved, 0);
    assert_eq!(before.run.unresolved.len(), 1);
    let report = before.report(&settings, &RoleWeights::standard(), Utc::now());
    assert_eq!(report.status, RunStatus::Degraded);
    assert_eq!(report.indirect_identity_unresolved_sample.len(), 1);

    add_person(&pool, "Miguel  García").await.unwrap();
    let after = evaluate(&pool, &settings).await;
    assert_eq!(after.run.totals.indirect_edges_resolved, 1);
    assert!(after.run.unresolved.is_empty());
    assert_eq!(after.run.persons[0].resolution_breakdown.get("exact_name"), Some(&1));
}

#[tokio::test]
async fn test_out_of_window_edges_are_ineligible() {
    let (_dir, pool) = create_test_db().await.unwrap();
    add_person(&pool, "Juan Pérez").await.unwrap();
    add_indirect_edge(&pool, &indirect_row("frag-1", "approve", "Juan Pérez", "2017-05-01"))
        .await
        .unwrap();
    add_indirect_edge(&pool, &indirect_row("frag-2", "approve", "Juan Pérez", "05/2019"))
        .await
        .unwrap();

    let mut late = indirect_row("frag-3", "approve", "Juan Pérez", "2021-01-01");
    late.appointment_end_date = Some("2020-06-30".to_string());
    add_indirect_edge(&pool, &late).await.unwrap();

    let evaluation = evaluate(&pool, &ScoringSettings::default()).await;
    let totals = &evaluation.run.totals;
    assert_eq!(totals.indirect_edges_ineligible, 3);
    assert_eq!(totals.indirect_ineligible_reasons.get("evidence_before_start"), Some(&1));
    assert_eq!(totals.indirect_ineligible_reasons.get("malformed_date"), Some(&1));
    assert_eq!(totals.indirect_ineligible_reasons.get("evidence_after_end"), Some(&1));
    assert!(evaluation.run.persons.is_empty());
    assert!(evaluation.run.cohort_empty());
}

#[tokio::test]
async fn test_filter_excludes_distant_edges() {
    let (_dir, pool) = create_test_db().await.unwrap();
    add_person(&pool, "Juan Pérez").await.unwrap();
    let mut distant = indirect_row("frag-1", "approve", "Juan Pérez", "2019-05-01");
    distant.causal_distance = 5;
    add_indirect_edge(&pool, &distant).await.unwrap();
    set_irlc(&pool, "frag-1", 1.0).await.unwrap();

    let evaluation = evaluate(&pool, &ScoringSettings::default()).await;
    assert_eq!(evaluation.run.totals.indirect_edges_eligible, 1);
    assert_eq!(evaluation.run.totals.indirect_edges_filtered_out, 1);
    assert!(evaluation.run.persons.is_empty());

    let mut settings = ScoringSettings::default();
    settings.filter.max_causal_distance = 5;
    let widened = evaluate(&pool, &settings).await;
    assert_eq!(widened.run.totals.persons_scored_total, 1);
}

#[tokio::test]
async fn test_missing_irlc_scores_zero() {
    let (_dir, pool) = create_test_db().await.unwrap();
    let ana = add_person(&pool, "Ana Ruiz").await.unwrap();
    add_direct_edge(&pool, "frag-1", "approve", Some(ana), "Ana Ruiz", false)
        .await
        .unwrap();

    let evaluation = evaluate(&pool, &ScoringSettings::default()).await;
    assert_eq!(evaluation.run.totals.edges_missing_irlc, 1);
    assert_eq!(evaluation.run.persons[0].weighted_score_raw, 0.0);
    assert_eq!(evaluation.run.persons[0].responsibility_score_personal, 0.0);
}
