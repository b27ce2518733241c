//! Reconciliation service tests against an in-memory database.

mod common;

use common::{date, daily, day_one, engine, setup};
use premia_core::reconciliation::{
    ItemStatus, MatchPolicy, MatchType, ReconciliationStatus, StatementItem,
};
use premia_db::ReconciliationService;
use premia_db::services::ReconciliationError;
use premia_shared::types::{ActorId, Cents};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

fn item(reference: &str, amount: i64) -> StatementItem {
    StatementItem {
        reference: reference.to_string(),
        amount: Cents(amount),
        date: date(2026, 2, 3),
    }
}

async fn seed_receipts(db: &DatabaseConnection) {
    let engine = engine(db);
    let on = date(2026, 2, 3);
    for receipt in [
        day_one("MM-001", Uuid::new_v4(), on),
        daily("MM-002", Uuid::new_v4(), on, 1),
        daily("MM-003", Uuid::new_v4(), on, 2),
    ] {
        assert!(engine.post_payment_receipt(&receipt).await.success);
    }
}

fn statement() -> Vec<StatementItem> {
    vec![
        item("MM-001", 104_800),
        item("X-999", 8_700),
        item("MM-777", 5_000),
    ]
}

#[tokio::test]
async fn test_daily_statement_matching() {
    let db = setup().await;
    seed_receipts(&db).await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());

    let run = service
        .create_reconciliation(date(2026, 2, 3), "mobile-money", &statement(), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.summary.status, ReconciliationStatus::PartiallyMatched);
    assert_eq!(run.summary.total_items, 3);
    assert_eq!(run.summary.matched_count, 2);
    assert_eq!(run.summary.unmatched_count, 1);
    assert_eq!(run.summary.source_balance, Cents(118_500));
    assert_eq!(run.summary.ledger_balance, Cents(113_500));
    assert_eq!(run.summary.variance, Cents(5_000));

    let kinds: Vec<_> = run.items.iter().map(|i| i.match_type).collect();
    assert_eq!(
        kinds,
        vec![MatchType::Exact, MatchType::AmountOnly, MatchType::None]
    );
    assert_eq!(run.items[0].match_confidence, 100);
    assert_eq!(run.items[1].match_confidence, 80);
    assert_eq!(run.items[1].matched_transaction_id.as_deref(), Some("MM-002"));
    assert!(run.items[1].matched_journal_entry_id.is_some());
    assert_eq!(run.items[2].status, ItemStatus::Unmatched);
    assert_eq!(run.items[2].ledger_amount, None);

    let found = service
        .find_for_date(date(2026, 2, 3), "mobile-money")
        .await
        .unwrap();
    assert_eq!(found.map(|r| r.id), Some(run.id));
}

#[tokio::test]
async fn test_manual_match_updates_summary() {
    let db = setup().await;
    seed_receipts(&db).await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());
    let run = service
        .create_reconciliation(date(2026, 2, 3), "mobile-money", &statement(), None)
        .await
        .unwrap()
        .unwrap();
    let unmatched = run.items[2].id;
    let operator = ActorId::new();

    let updated = service
        .manual_match(unmatched, "MM-003", operator, Some("agent float top-up"))
        .await
        .unwrap();

    assert_eq!(updated.summary.status, ReconciliationStatus::Matched);
    assert_eq!(updated.summary.matched_count, 3);
    assert_eq!(updated.summary.unmatched_count, 0);
    assert_eq!(updated.summary.manual_matched_count, 1);
    assert_eq!(updated.summary.ledger_balance, Cents(130_900));
    assert_eq!(updated.summary.variance, Cents(-12_400));

    let matched = &updated.items[2];
    assert_eq!(matched.match_type, MatchType::Manual);
    assert_eq!(matched.status, ItemStatus::Matched);
    assert_eq!(matched.ledger_amount, Some(Cents(17_400)));
    assert_eq!(matched.resolved_by, Some(operator));

    let err = service
        .manual_match(unmatched, "MM-003", operator, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::InvalidState {
            status: ItemStatus::Matched,
            ..
        }
    ));
}

#[tokio::test]
async fn test_manual_match_rejects_claimed_transaction() {
    let db = setup().await;
    seed_receipts(&db).await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());
    let run = service
        .create_reconciliation(date(2026, 2, 3), "mobile-money", &statement(), None)
        .await
        .unwrap()
        .unwrap();
    let unmatched = run.items[2].id;

    let err = service
        .manual_match(unmatched, "MM-001", ActorId::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ALREADY_CLAIMED");
    assert!(matches!(
        err,
        ReconciliationError::AlreadyClaimed { ref transaction_id, item }
            if transaction_id == "MM-001" && item == run.items[0].id
    ));

    // Amount-only matches hold their transaction too.
    let err = service
        .manual_match(unmatched, "MM-002", ActorId::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::AlreadyClaimed { item, .. } if item == run.items[1].id
    ));

    let unchanged = service.get_reconciliation(run.id).await.unwrap();
    assert_eq!(unchanged.summary, run.summary);
    assert_eq!(unchanged.items[2].status, ItemStatus::Unmatched);
}

#[tokio::test]
async fn test_manual_match_unknown_transaction() {
    let db = setup().await;
    seed_receipts(&db).await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());
    let run = service
        .create_reconciliation(date(2026, 2, 3), "mobile-money", &statement(), None)
        .await
        .unwrap()
        .unwrap();

    let err = service
        .manual_match(run.items[2].id, "MM-404", ActorId::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    let unchanged = service.get_reconciliation(run.id).await.unwrap();
    assert_eq!(unchanged.summary, run.summary);
}

#[tokio::test]
async fn test_resolve_item_rules() {
    let db = setup().await;
    seed_receipts(&db).await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());
    let run = service
        .create_reconciliation(date(2026, 2, 3), "mobile-money", &statement(), None)
        .await
        .unwrap()
        .unwrap();
    let operator = ActorId::new();

    let err = service
        .resolve_item(run.items[2].id, operator, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconciliationError::ResolutionNotesRequired));

    let err = service
        .resolve_item(run.items[0].id, operator, "not needed")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconciliationError::InvalidState { .. }));

    let resolved = service
        .resolve_item(run.items[2].id, operator, " reversed by provider ")
        .await
        .unwrap();
    assert_eq!(resolved.status, ItemStatus::Resolved);
    assert_eq!(resolved.resolution_notes.as_deref(), Some("reversed by provider"));
    assert!(resolved.resolved_at.is_some());

    let after = service.get_reconciliation(run.id).await.unwrap();
    assert_eq!(after.summary.unmatched_count, 1);
    assert_eq!(after.summary.status, ReconciliationStatus::PartiallyMatched);
}

#[tokio::test]
async fn test_empty_statement_creates_nothing() {
    let db = setup().await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());

    let run = service
        .create_reconciliation(date(2026, 2, 3), "mobile-money", &[], Some(ActorId::new()))
        .await
        .unwrap();

    assert!(run.is_none());
    assert!(
        service
            .find_for_date(date(2026, 2, 3), "mobile-money")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_receipts_from_other_days_are_ignored() {
    let db = setup().await;
    let engine = engine(&db);
    engine
        .post_payment_receipt(&day_one("MM-001", Uuid::new_v4(), date(2026, 2, 2)))
        .await;
    let service = ReconciliationService::new(db.clone(), MatchPolicy::default());

    let run = service
        .create_reconciliation(
            date(2026, 2, 3),
            "mobile-money",
            &[item("MM-001", 104_800)],
            None,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.summary.status, ReconciliationStatus::Unmatched);
    assert_eq!(run.summary.ledger_balance, Cents::ZERO);
}
