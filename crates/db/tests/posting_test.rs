//! Posting engine and journal store tests against an in-memory database.

mod common;

use common::{balance, date, daily, day_one, engine, setup};
use futures::future::join_all;
use premia_core::ledger::{EntryDraft, EntryStatus, EntryType, JournalLineInput, LedgerError};
use premia_core::posting::{
    CommissionReceipt, PremiumRemittance, RefundInitiation, RefundPayout, ServiceFeeDistribution,
};
use premia_db::repositories::{GlAccountError, JournalError};
use premia_db::{GlAccountRepository, JournalRepository};
use premia_shared::types::Cents;
use uuid::Uuid;

#[tokio::test]
async fn test_day_one_receipt_allocation() {
    let db = setup().await;
    let engine = engine(&db);

    let result = engine
        .post_payment_receipt(&day_one("MM-001", Uuid::new_v4(), date(2026, 1, 5)))
        .await;

    assert!(result.success, "{:?}", result.message);
    assert!(!result.already_posted);
    assert_eq!(balance(&db, "1010").await, 104_800);
    assert_eq!(balance(&db, "4010").await, 2_400);
    assert_eq!(balance(&db, "2030").await, 1_200);
    assert_eq!(balance(&db, "2040").await, 1_200);
    assert_eq!(balance(&db, "2010").await, 100_000);

    let entry = engine
        .journal()
        .get_by_id(result.journal_entry_id.unwrap())
        .await
        .unwrap();
    assert_eq!(entry.entry_number, "JE-20260105-0001");
    assert_eq!(entry.entry_type, EntryType::PaymentReceiptDay1);
    assert_eq!(entry.status, EntryStatus::Posted);
    assert_eq!(entry.lines.len(), 5);
}

#[tokio::test]
async fn test_multi_day_payment_scales_fees() {
    let db = setup().await;
    let engine = engine(&db);

    let result = engine
        .post_payment_receipt(&daily("MM-002", Uuid::new_v4(), date(2026, 1, 6), 3))
        .await;

    assert!(result.success);
    assert_eq!(balance(&db, "1010").await, 26_100);
    assert_eq!(balance(&db, "4010").await, 600);
    assert_eq!(balance(&db, "2030").await, 300);
    assert_eq!(balance(&db, "2040").await, 300);
    assert_eq!(balance(&db, "2010").await, 24_900);
}

#[tokio::test]
async fn test_same_source_posts_once() {
    let db = setup().await;
    let engine = engine(&db);
    let receipt = day_one("MM-001", Uuid::new_v4(), date(2026, 1, 5));

    let first = engine.post_payment_receipt(&receipt).await;
    let second = engine.post_payment_receipt(&receipt).await;

    assert!(first.success && !first.already_posted);
    assert!(second.success && second.already_posted);
    assert_eq!(first.journal_entry_id, second.journal_entry_id);
    assert_eq!(balance(&db, "1010").await, 104_800);

    let entries = engine
        .journal()
        .get_by_date_range(date(2026, 1, 1), date(2026, 1, 31))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicates_post_once() {
    let db = setup().await;
    let engine = engine(&db);
    let receipt = day_one("MM-RACE", Uuid::new_v4(), date(2026, 1, 5));

    let results = join_all((0..8).map(|_| engine.post_payment_receipt(&receipt))).await;

    assert!(results.iter().all(|r| r.success));
    assert_eq!(results.iter().filter(|r| !r.already_posted).count(), 1);
    assert_eq!(balance(&db, "1010").await, 104_800);
}

#[tokio::test]
async fn test_concurrent_receipts_keep_balances_exact() {
    let db = setup().await;
    let engine = engine(&db);
    let receipts: Vec<_> = (0..20)
        .map(|i| daily(&format!("MM-{i:03}"), Uuid::new_v4(), date(2026, 1, 7), 1))
        .collect();

    let results = join_all(receipts.iter().map(|r| engine.post_payment_receipt(r))).await;

    assert!(results.iter().all(|r| r.success && !r.already_posted));
    assert_eq!(balance(&db, "1010").await, 20 * 8_700);
    assert_eq!(balance(&db, "2030").await, 20 * 100);

    let entries = engine
        .journal()
        .get_by_date_range(date(2026, 1, 7), date(2026, 1, 7))
        .await
        .unwrap();
    let mut numbers: Vec<_> = entries.iter().map(|e| e.entry_number.clone()).collect();
    numbers.dedup();
    assert_eq!(numbers.len(), 20);
    assert_eq!(numbers.last().unwrap(), "JE-20260107-0020");
}

#[tokio::test]
async fn test_receipt_below_fees_fails_without_writing() {
    let db = setup().await;
    let engine = engine(&db);
    let mut receipt = day_one("MM-SHORT", Uuid::new_v4(), date(2026, 1, 5));
    receipt.amount = Cents(4_000);

    let result = engine.post_payment_receipt(&receipt).await;

    assert!(!result.success);
    assert!(result.journal_entry_id.is_none());
    assert!(result.message.is_some());
    assert_eq!(balance(&db, "1010").await, 0);
    assert!(
        engine
            .journal()
            .get_by_source_transaction_id("MM-SHORT")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_refund_remittance_and_distribution_flow() {
    let db = setup().await;
    let engine = engine(&db);
    let rider = Uuid::new_v4();
    let on = date(2026, 1, 10);

    assert!(engine.post_payment_receipt(&day_one("MM-001", rider, on)).await.success);

    let refund = engine
        .post_refund(&RefundInitiation {
            source_transaction_id: "RF-20260110-0001".into(),
            rider_id: Some(rider),
            amount: Cents(20_000),
            fee: Cents(500),
            date: on,
        })
        .await;
    assert!(refund.success);
    assert_eq!(balance(&db, "2010").await, 79_500);
    assert_eq!(balance(&db, "2020").await, 20_000);
    assert_eq!(balance(&db, "4030").await, 500);

    let payout = engine
        .post_refund_payout(&RefundPayout {
            source_transaction_id: "RF-PAY-1".into(),
            rider_id: Some(rider),
            amount: Cents(20_000),
            date: on,
        })
        .await;
    assert!(payout.success);
    assert_eq!(balance(&db, "2020").await, 0);

    let remit = engine
        .post_remittance(&PremiumRemittance {
            source_transaction_id: "REM-1".into(),
            amount: Cents(79_500),
            date: on,
        })
        .await;
    assert!(remit.success);
    assert_eq!(balance(&db, "2010").await, 0);

    let distribution = engine
        .post_service_fee_distribution(&ServiceFeeDistribution {
            source_transaction_id: "DIST-1".into(),
            platform: Cents(2_400),
            kba: Cents(1_200),
            robs: Cents(1_200),
            date: on,
        })
        .await;
    assert!(distribution.success);
    assert_eq!(balance(&db, "1010").await, 500);
    assert_eq!(balance(&db, "1020").await, 2_400);
    assert_eq!(balance(&db, "2030").await, 0);

    let commission = engine
        .post_commission_receipt(&CommissionReceipt {
            source_transaction_id: "COM-1".into(),
            amount: Cents(50_000),
            date: on,
        })
        .await;
    assert!(commission.success);
    assert_eq!(balance(&db, "4020").await, 50_000);

    let trial = GlAccountRepository::new(db.clone())
        .get_trial_balance()
        .await
        .unwrap();
    assert!(trial.is_balanced);
    assert_eq!(trial.total_debit, trial.total_credit);
}

#[tokio::test]
async fn test_reversal_restores_balances_once() {
    let db = setup().await;
    let engine = engine(&db);
    let posted = engine
        .post_payment_receipt(&day_one("MM-001", Uuid::new_v4(), date(2026, 1, 5)))
        .await;
    let original_id = posted.journal_entry_id.unwrap();

    let reversal = engine.reverse_entry(original_id, "duplicate payment").await;
    assert!(reversal.success && !reversal.already_posted);
    assert_eq!(balance(&db, "1010").await, 0);
    assert_eq!(balance(&db, "2010").await, 0);
    assert_eq!(balance(&db, "4010").await, 0);

    let original = engine.journal().get_by_id(original_id).await.unwrap();
    assert_eq!(original.status, EntryStatus::Reversed);

    let again = engine.reverse_entry(original_id, "duplicate payment").await;
    assert!(again.success && again.already_posted);
    assert_eq!(again.journal_entry_id, reversal.journal_entry_id);
    assert_eq!(balance(&db, "1010").await, 0);
}

#[tokio::test]
async fn test_draft_entry_leaves_balances_until_posted() {
    let db = setup().await;
    let journal = JournalRepository::new(db.clone());
    let draft = EntryDraft {
        entry_type: EntryType::CommissionReceipt,
        entry_date: date(2026, 1, 8),
        source_transaction_id: "COM-DRAFT".into(),
        rider_id: None,
        description: "Commission".into(),
        lines: vec![
            JournalLineInput::debit("1020", Cents(1_000)),
            JournalLineInput::credit("4020", Cents(1_000)),
        ],
    };

    let entry = journal.create(&draft, false).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Draft);
    assert_eq!(balance(&db, "1020").await, 0);

    let posted = journal.post_entry(entry.id).await.unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
    assert_eq!(balance(&db, "1020").await, 1_000);
    assert_eq!(balance(&db, "4020").await, 1_000);

    let err = journal.post_entry(entry.id).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn test_unbalanced_or_unknown_lines_are_rejected() {
    let db = setup().await;
    let journal = JournalRepository::new(db.clone());
    let mut draft = EntryDraft {
        entry_type: EntryType::CommissionReceipt,
        entry_date: date(2026, 1, 8),
        source_transaction_id: "BAD-1".into(),
        rider_id: None,
        description: "Unbalanced".into(),
        lines: vec![
            JournalLineInput::debit("1020", Cents(1_000)),
            JournalLineInput::credit("4020", Cents(900)),
        ],
    };

    let err = journal.create(&draft, true).await.unwrap_err();
    assert_eq!(err.error_code(), "UNBALANCED");

    draft.lines = vec![
        JournalLineInput::debit("9999", Cents(1_000)),
        JournalLineInput::credit("4020", Cents(1_000)),
    ];
    let err = journal.create(&draft, true).await.unwrap_err();
    assert!(matches!(
        err,
        JournalError::Ledger(LedgerError::AccountNotFound(code)) if code == "9999"
    ));

    assert!(journal.get_by_source_transaction_id("BAD-1").await.unwrap().is_none());
    assert_eq!(balance(&db, "4020").await, 0);
}

#[tokio::test]
async fn test_inactive_account_rejects_postings() {
    let db = setup().await;
    let accounts = GlAccountRepository::new(db.clone());
    let capital = accounts.get_by_code("3010").await.unwrap();
    accounts.deactivate(capital.id).await.unwrap();

    let journal = JournalRepository::new(db.clone());
    let draft = EntryDraft {
        entry_type: EntryType::CommissionReceipt,
        entry_date: date(2026, 1, 8),
        source_transaction_id: "CAP-1".into(),
        rider_id: None,
        description: "Capital".into(),
        lines: vec![
            JournalLineInput::debit("1020", Cents(5_000)),
            JournalLineInput::credit("3010", Cents(5_000)),
        ],
    };
    let err = journal.create(&draft, true).await.unwrap_err();
    assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");
    assert_eq!(balance(&db, "1020").await, 0);
}

#[tokio::test]
async fn test_account_registry_rules() {
    let db = setup().await;
    let accounts = GlAccountRepository::new(db.clone());
    let engine = engine(&db);
    engine
        .post_payment_receipt(&day_one("MM-001", Uuid::new_v4(), date(2026, 1, 5)))
        .await;

    let escrow = accounts.get_by_code("1010").await.unwrap();
    let err = accounts.deactivate(escrow.id).await.unwrap_err();
    assert!(matches!(err, GlAccountError::HasBalance { balance, .. } if balance == Cents(104_800)));

    let err = accounts
        .create(premia_db::repositories::CreateAccountInput {
            code: "1010".into(),
            name: "Again".into(),
            account_type: premia_core::ledger::AccountType::Asset,
            parent_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DUPLICATE_ACCOUNT");

    let chart = accounts.get_chart_of_accounts().await.unwrap();
    let roots: Vec<_> = chart.iter().map(|n| n.account.code.as_str()).collect();
    assert_eq!(roots, vec!["1000", "2000", "3000", "4000", "5000"]);
    assert_eq!(chart[1].children.len(), 6);

    // Seeding again creates nothing.
    assert_eq!(accounts.seed_standard_chart().await.unwrap(), 0);
}
