//! End-to-end tests against the SQLite store
//!
//! Each test gets its own database in a temporary directory.

mod helpers;

use helpers::*;
use rollcall::store::RosterStore;
use rollcall::{EngineConfig, EngineError, Metric, PeriodStatus, Reconciler, RunOutcome, SubmissionRecord};

async fn seeded_store() -> (tempfile::TempDir, rollcall::store::SqliteStore) {
    let (dir, store) = create_test_store().await;
    store
        .upsert_roster_entry(&roster_row(1, "Ana", "Lopez", "5551234567"))
        .await
        .unwrap();
    store.open_period(PERIOD, FORM_LINK, None).await.unwrap();
    (dir, store)
}

async fn history_count(store: &rollcall::store::SqliteStore) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM history")
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_scenario_a_sqlite() {
    let (_dir, store) = seeded_store().await;
    let reconciler = Reconciler::new(store, RecordingGateway::default(), EngineConfig::default());

    let outcome = reconciler.run().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Escalated { jobs_sent: 1, .. }));
    assert_eq!(reconciler.gateway().sent_to(), vec!["+15551234567".to_string()]);
    let period = reconciler.store().read_period(PERIOD).await.unwrap();
    assert_eq!(period.status, PeriodStatus::Pending);
}

#[tokio::test]
async fn test_scenario_b_and_c_sqlite() {
    let (_dir, store) = seeded_store().await;
    store
        .record_submission(
            PERIOD,
            &SubmissionRecord::new("Ana  Lopez", "2026-10-01 12:00:00")
                .with_metric(Metric::number("hours", 10.0))
                .with_metric(Metric::text("notes", "visited 3 homes")),
        )
        .await
        .unwrap();
    let reconciler = Reconciler::new(store, RecordingGateway::default(), EngineConfig::default());

    // B: complete, one history row
    let outcome = reconciler.run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { history_appended: 1, .. }));
    assert_eq!(
        reconciler.store().read_period(PERIOD).await.unwrap().status,
        PeriodStatus::Complete
    );

    let history = reconciler.store().read_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reported_identity, "Ana Lopez");
    assert_eq!(
        history[0].metrics,
        vec![
            Metric::number("hours", 10.0),
            Metric::text("notes", "visited 3 homes"),
        ]
    );

    // C: re-run is a no-op
    let outcome = reconciler.run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::AlreadyComplete { .. }));
    assert_eq!(history_count(reconciler.store()).await, 1);
    assert!(reconciler.gateway().sent_to().is_empty());
}

#[tokio::test]
async fn test_current_period_is_latest_opened() {
    let (_dir, store) = seeded_store().await;
    store.open_period("2026-11", "https://forms.example.org/2026-11", None).await.unwrap();

    assert_eq!(store.current_period_key().await.unwrap(), "2026-11");

    // Re-opening an older period keeps its position and its status
    store.write_period_status(PERIOD, PeriodStatus::Complete).await.unwrap();
    store.open_period(PERIOD, FORM_LINK, None).await.unwrap();
    assert_eq!(store.current_period_key().await.unwrap(), "2026-11");
    assert_eq!(store.read_period(PERIOD).await.unwrap().status, PeriodStatus::Complete);
}

#[tokio::test]
async fn test_no_period_is_data_error() {
    let (_dir, store) = create_test_store().await;
    assert!(matches!(
        store.current_period_key().await,
        Err(EngineError::DataIntegrity(_))
    ));
}

#[tokio::test]
async fn test_empty_roster_is_data_error() {
    let (_dir, store) = create_test_store().await;
    store.open_period(PERIOD, FORM_LINK, None).await.unwrap();
    let reconciler = Reconciler::new(store, RecordingGateway::default(), EngineConfig::default());

    assert!(matches!(
        reconciler.run().await,
        Err(EngineError::DataIntegrity(_))
    ));
    assert_eq!(
        reconciler.store().read_period(PERIOD).await.unwrap().status,
        PeriodStatus::Pending
    );
}

#[tokio::test]
async fn test_roster_row_without_delegate_fails_ingestion() {
    let (_dir, store) = seeded_store().await;
    let mut row = roster_row(2, "Eva", "Ruiz", "");
    row.direct_contact = false;
    store.upsert_roster_entry(&row).await.unwrap();

    let err = store.read_roster(PERIOD).await.unwrap_err();
    match err {
        EngineError::DataIntegrity(msg) => assert!(msg.contains("Eva Ruiz")),
        other => panic!("expected DataIntegrity, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delegate_to_unknown_id_leaves_store_untouched() {
    let (_dir, store) = seeded_store().await;
    let mut row = roster_row(2, "Eva", "Ruiz", "");
    row.direct_contact = false;
    row.delegate_id = Some(99);
    store.upsert_roster_entry(&row).await.unwrap();
    store
        .record_submission(PERIOD, &SubmissionRecord::new("Ana Lopez", "2026-10-01 12:00:00"))
        .await
        .unwrap();
    let reconciler = Reconciler::new(store, RecordingGateway::default(), EngineConfig::default());

    assert!(matches!(
        reconciler.run().await,
        Err(EngineError::DataIntegrity(_))
    ));
    assert_eq!(history_count(reconciler.store()).await, 0);
    assert!(reconciler.gateway().sent_to().is_empty());
}

#[tokio::test]
async fn test_non_finite_metric_is_refused() {
    let (_dir, store) = seeded_store().await;

    for value in [f64::NAN, f64::INFINITY] {
        let submission = SubmissionRecord::new("Ana Lopez", "2026-10-01 12:00:00")
            .with_metric(Metric::number("hours", value));
        assert!(matches!(
            store.record_submission(PERIOD, &submission).await,
            Err(EngineError::DataIntegrity(_))
        ));
    }

    // Nothing stored, so the period stays readable
    assert!(store.read_submissions(PERIOD).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_history_ignores_existing_rows() {
    let (_dir, store) = seeded_store().await;
    let rows = vec![rollcall::HistoryRecord::from_submission(
        PERIOD,
        &SubmissionRecord::new("Ana Lopez", "2026-10-01 12:00:00"),
    )];

    store.write_history(&rows).await.unwrap();
    store.write_history(&rows).await.unwrap();

    assert_eq!(history_count(&store).await, 1);
}

#[tokio::test]
async fn test_inactive_and_delegated_rows_round_trip() {
    let (_dir, store) = seeded_store().await;
    let mut eva = roster_row(2, "Eva", "Ruiz", "");
    eva.direct_contact = false;
    eva.delegate_id = Some(1);
    let mut luis = roster_row(3, "Luis", "Mora", "5550000003");
    luis.active = false;
    store.upsert_roster_entry(&eva).await.unwrap();
    store.upsert_roster_entry(&luis).await.unwrap();

    let roster = store.read_roster(PERIOD).await.unwrap();

    assert_eq!(roster.len(), 3);
    assert_eq!(roster[1].delegate_id(), Some(rollcall::RosterId(1)));
    assert!(!roster[2].is_active());
}
