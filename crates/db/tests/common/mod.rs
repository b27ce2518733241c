//! Shared setup for database tests: an in-memory SQLite database migrated
//! with the real migrator and seeded with the standard chart.

#![allow(dead_code)]

use chrono::NaiveDate;
use premia_core::posting::{PaymentReceipt, PostingPolicy, ReceiptKind};
use premia_db::migration::{Migrator, MigratorTrait};
use premia_db::{GlAccountRepository, PostingEngine};
use premia_shared::types::Cents;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    GlAccountRepository::new(db.clone())
        .seed_standard_chart()
        .await
        .unwrap();
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn engine(db: &DatabaseConnection) -> PostingEngine {
    PostingEngine::new(db.clone(), PostingPolicy::default())
}

pub fn day_one(source: &str, rider: Uuid, on: NaiveDate) -> PaymentReceipt {
    PaymentReceipt {
        source_transaction_id: source.to_string(),
        rider_id: Some(rider),
        amount: Cents(104_800),
        date: on,
        kind: ReceiptKind::DayOne,
    }
}

pub fn daily(source: &str, rider: Uuid, on: NaiveDate, days: u32) -> PaymentReceipt {
    PaymentReceipt {
        source_transaction_id: source.to_string(),
        rider_id: Some(rider),
        amount: Cents(8_700 * i64::from(days)),
        date: on,
        kind: ReceiptKind::Daily { days },
    }
}

pub async fn balance(db: &DatabaseConnection, code: &str) -> i64 {
    GlAccountRepository::new(db.clone())
        .get_by_code(code)
        .await
        .unwrap()
        .balance
        .get()
}
