//! Premia job worker.
//!
//! Runs one scheduled job and prints its summary as JSON. Meant to be
//! invoked by cron or a systemd timer.
//!
//! Usage:
//!   premia-worker list
//!   premia-worker run daily-reconciliation --date 2026-02-03
//!   premia-worker run commission-settlements --from 2026-01-01 --to 2026-01-31

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use premia_core::settlement::SettlementPeriod;
use premia_db::jobs::{JobContext, standard_scheduler};
use premia_db::services::LoggingNotifier;
use premia_shared::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "premia-worker")]
#[command(about = "Runs Premia's scheduled ledger jobs")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, env = "PREMIA_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered jobs.
    List,
    /// Run one job.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Job name.
    job: String,

    /// Business date, defaults to today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Settlement period start, defaults to the first day of the previous month.
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Settlement period end, defaults to the last day of the previous month.
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

impl RunArgs {
    fn context(&self) -> anyhow::Result<JobContext> {
        let ctx = JobContext::for_date(self.date.unwrap_or_else(|| Utc::now().date_naive()));
        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                let period = SettlementPeriod::new(from, to)
                    .with_context(|| format!("invalid period {from}..{to}"))?;
                Ok(ctx.with_period(period))
            }
            _ => Ok(ctx),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "premia=info,premia_db=info,sea_orm=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = premia_db::connect_with(&config.database).await?;
    tracing::info!("Connected to database");

    let scheduler = standard_scheduler(&db, &config, Arc::new(LoggingNotifier));

    match cli.command {
        Command::List => {
            for name in scheduler.job_names() {
                println!("{name}");
            }
        }
        Command::Run(args) => {
            let ctx = args.context()?;
            let summary = scheduler.run(&args.job, &ctx).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !summary.is_clean() {
                bail!("{} unit(s) of {} failed", summary.failed, summary.job);
            }
        }
    }

    Ok(())
}
