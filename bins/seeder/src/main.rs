//! Seeds the standard chart of accounts.
//!
//! Safe to re-run: accounts that already exist are left alone.
//!
//! Usage: cargo run --bin seeder

use premia_db::GlAccountRepository;
use premia_shared::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "premia=info,premia_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let db = premia_db::connect_with(&config.database).await?;

    let created = GlAccountRepository::new(db)
        .seed_standard_chart()
        .await?;
    tracing::info!(created, "Seeding complete");

    Ok(())
}
