//! Report repository: aggregates stored ledger data for the report builders.
//!
//! Activity counts Posted and Reversed entries alike. A reversed entry and
//! its reversal are both present, so their effects cancel.

use std::collections::HashMap;

use chrono::NaiveDate;
use premia_core::ledger::TrialBalance;
use premia_core::reports::{
    self, AccountActivity, BalanceSheet, IncomeStatement, JournalRow, PartnerActivity,
    PartnerStatement, ReportService, SettlementSummaryRow, TrialBalanceReport, TrialBalanceRow,
};
use premia_core::settlement::{PartnerType, SettlementType};
use premia_shared::types::Cents;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::gl_account::{GlAccountError, GlAccountRepository, to_domain};
use super::journal::{JournalError, JournalRepository, load_lines};
use crate::entities::{
    gl_accounts, journal_entries, partner_settlements, sea_orm_active_enums as stored,
};

/// Error types for report queries.
#[derive(Debug, thiserror::Error)]
pub enum ReportQueryError {
    /// Invalid report parameters.
    #[error(transparent)]
    Report(#[from] reports::ReportError),

    /// Account lookup failed.
    #[error(transparent)]
    Account(#[from] GlAccountError),

    /// Journal lookup failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ReportQueryError {
    /// Returns the error code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Report(e) => e.error_code(),
            Self::Account(e) => e.error_code(),
            Self::Journal(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Date filter on entry dates, both ends inclusive.
#[derive(Debug, Clone, Copy, Default)]
struct DateWindow {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Trial balance over current account balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn trial_balance(&self) -> Result<TrialBalanceReport, ReportQueryError> {
        let balance = self.current_trial_balance().await?;
        Ok(ReportService::trial_balance(&balance))
    }

    /// Balance sheet from all activity up to and including `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheet, ReportQueryError> {
        let activity = self
            .account_activity(DateWindow {
                from: None,
                to: Some(as_of),
            })
            .await?;
        let sheet = ReportService::balance_sheet(as_of, &activity);
        if !sheet.is_balanced {
            tracing::error!(
                %as_of,
                total_assets = sheet.total_assets.cents,
                liabilities_and_equity = sheet.liabilities_and_equity.cents,
                "Balance sheet does not balance"
            );
        }
        Ok(sheet)
    }

    /// Income statement for `[start, end]`.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start > end`, or a query failure.
    pub async fn income_statement(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IncomeStatement, ReportQueryError> {
        ReportService::validate_range(start, end)?;
        let activity = self
            .account_activity(DateWindow {
                from: Some(start),
                to: Some(end),
            })
            .await?;
        Ok(ReportService::income_statement(start, end, &activity)?)
    }

    /// Statement of a partner's payable accounts for `[start, end]` with the
    /// settlements whose period overlaps it.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start > end`, or a query failure.
    pub async fn partner_statement(
        &self,
        partner: PartnerType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PartnerStatement, ReportQueryError> {
        ReportService::validate_range(start, end)?;
        let codes = [
            partner.service_fee_payable_code(),
            partner.commission_payable_code(),
        ];

        let opening: Cents = self
            .partner_activity(&codes, DateWindow {
                from: None,
                to: start.pred_opt(),
            })
            .await?
            .iter()
            .map(|a| a.credit - a.debit)
            .sum();

        let activity = self
            .partner_activity(&codes, DateWindow {
                from: Some(start),
                to: Some(end),
            })
            .await?;

        let settlements = partner_settlements::Entity::find()
            .filter(partner_settlements::Column::PartnerType.eq(stored::PartnerType::from(partner)))
            .filter(partner_settlements::Column::PeriodStart.lte(end))
            .filter(partner_settlements::Column::PeriodEnd.gte(start))
            .order_by_asc(partner_settlements::Column::SettlementNumber)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| SettlementSummaryRow {
                settlement_number: s.settlement_number,
                settlement_type: SettlementType::from(s.settlement_type),
                status: s.status.into(),
                period_start: s.period_start,
                period_end: s.period_end,
                amount: Cents(s.total_amount).into(),
            })
            .collect();

        Ok(ReportService::partner_statement(
            partner,
            start,
            end,
            opening,
            &activity,
            settlements,
        )?)
    }

    /// Flat trial balance rows for export.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn export_trial_balance(&self) -> Result<Vec<TrialBalanceRow>, ReportQueryError> {
        let balance = self.current_trial_balance().await?;
        Ok(reports::trial_balance_rows(&balance))
    }

    /// Flat journal rows (one per line) for entries dated in `[start, end]`.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start > end`, or a query failure.
    pub async fn export_journal(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalRow>, ReportQueryError> {
        ReportService::validate_range(start, end)?;
        let entries = JournalRepository::new(self.db.clone())
            .get_by_date_range(start, end)
            .await?;
        Ok(reports::journal_rows(&entries))
    }

    async fn current_trial_balance(&self) -> Result<TrialBalance, ReportQueryError> {
        Ok(GlAccountRepository::new(self.db.clone())
            .get_trial_balance()
            .await?)
    }

    /// Entries counted by reports within the window, keyed by ID.
    async fn reportable_entries(
        &self,
        window: DateWindow,
    ) -> Result<HashMap<Uuid, journal_entries::Model>, DbErr> {
        let mut query = journal_entries::Entity::find().filter(
            journal_entries::Column::Status
                .is_in([stored::EntryStatus::Posted, stored::EntryStatus::Reversed]),
        );
        if let Some(from) = window.from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = window.to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }
        Ok(query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect())
    }

    async fn account_activity(
        &self,
        window: DateWindow,
    ) -> Result<Vec<AccountActivity>, ReportQueryError> {
        let entries = self.reportable_entries(window).await?;
        let ids: Vec<Uuid> = entries.keys().copied().collect();
        let lines = load_lines(&self.db, &ids).await?;

        let mut totals: HashMap<Uuid, (Cents, Cents)> = HashMap::new();
        for line in lines.values().flatten() {
            let slot = totals.entry(line.account_id).or_default();
            slot.0 += Cents(line.debit);
            slot.1 += Cents(line.credit);
        }

        let accounts = gl_accounts::Entity::find()
            .order_by_asc(gl_accounts::Column::Code)
            .all(&self.db)
            .await?;

        Ok(accounts
            .into_iter()
            .filter_map(|model| {
                let (debit, credit) = totals.get(&model.id).copied()?;
                let account = to_domain(model);
                Some(AccountActivity {
                    account_id: account.id,
                    code: account.code,
                    name: account.name,
                    account_type: account.account_type,
                    debit,
                    credit,
                })
            })
            .collect())
    }

    async fn partner_activity(
        &self,
        codes: &[&str],
        window: DateWindow,
    ) -> Result<Vec<PartnerActivity>, ReportQueryError> {
        // An unbounded window only arises as the opening window of a
        // statement starting at `NaiveDate::MIN`; nothing precedes it.
        if window.from.is_none() && window.to.is_none() {
            return Ok(Vec::new());
        }

        let entries = self.reportable_entries(window).await?;
        let ids: Vec<Uuid> = entries.keys().copied().collect();
        let lines = load_lines(&self.db, &ids).await?;

        let mut activity = Vec::new();
        for (entry_id, entry_lines) in &lines {
            let Some(entry) = entries.get(entry_id) else {
                continue;
            };
            for line in entry_lines {
                if !codes.contains(&line.account_code.as_str()) {
                    continue;
                }
                activity.push(PartnerActivity {
                    date: entry.entry_date,
                    entry_number: entry.entry_number.clone(),
                    entry_type: premia_core::ledger::EntryType::from(entry.entry_type)
                        .as_str()
                        .to_string(),
                    description: entry.description.clone(),
                    account_code: line.account_code.clone(),
                    debit: Cents(line.debit),
                    credit: Cents(line.credit),
                });
            }
        }
        Ok(activity)
    }
}
