//! Report generation service.
//!
//! Builders are pure: the caller supplies per-account activity aggregated
//! from posted and reversed entries, and gets presentation structures back.

use chrono::NaiveDate;
use premia_shared::types::Cents;

use super::error::ReportError;
use super::types::{
    AccountActivity, Amount, BalanceSheet, IncomeStatement, PartnerActivity, PartnerStatement,
    PartnerStatementLine, ReportLine, ReportSection, SettlementSummary, SettlementSummaryRow,
    TrialBalanceReport, TrialBalanceReportLine,
};
use crate::ledger::{AccountType, TrialBalance};
use crate::settlement::{PartnerType, SettlementStatus};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Rejects ranges whose start is after their end.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`.
    pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    /// Converts a ledger trial balance into its presentation form.
    #[must_use]
    pub fn trial_balance(balance: &TrialBalance) -> TrialBalanceReport {
        TrialBalanceReport {
            accounts: balance
                .lines
                .iter()
                .map(|l| TrialBalanceReportLine {
                    account_id: l.account_id,
                    code: l.code.clone(),
                    name: l.name.clone(),
                    account_type: l.account_type,
                    debit: l.debit.into(),
                    credit: l.credit.into(),
                })
                .collect(),
            total_debit: balance.total_debit.into(),
            total_credit: balance.total_credit.into(),
            is_balanced: balance.is_balanced,
        }
    }

    /// Generates a balance sheet from activity up to and including `as_of`.
    ///
    /// Income and expense activity is folded into retained earnings so the
    /// sheet balances whenever the underlying entries do.
    #[must_use]
    pub fn balance_sheet(as_of: NaiveDate, activities: &[AccountActivity]) -> BalanceSheet {
        let assets = Self::section(activities, AccountType::Asset);
        let liabilities = Self::section(activities, AccountType::Liability);
        let equity = Self::section(activities, AccountType::Equity);
        let retained = Self::net_of(activities, AccountType::Income)
            - Self::net_of(activities, AccountType::Expense);

        let total_assets = Cents(assets.total.cents);
        let total_liabilities = Cents(liabilities.total.cents);
        let total_equity = Cents(equity.total.cents) + retained;
        let liabilities_and_equity = total_liabilities + total_equity;

        BalanceSheet {
            as_of,
            assets,
            liabilities,
            equity,
            retained_earnings: retained.into(),
            total_assets: total_assets.into(),
            total_liabilities: total_liabilities.into(),
            total_equity: total_equity.into(),
            liabilities_and_equity: liabilities_and_equity.into(),
            is_balanced: total_assets == liabilities_and_equity,
        }
    }

    /// Generates an income statement for `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`.
    pub fn income_statement(
        start: NaiveDate,
        end: NaiveDate,
        activities: &[AccountActivity],
    ) -> Result<IncomeStatement, ReportError> {
        Self::validate_range(start, end)?;

        let income = Self::section(activities, AccountType::Income);
        let expenses = Self::section(activities, AccountType::Expense);
        let net_income = Cents(income.total.cents) - Cents(expenses.total.cents);

        Ok(IncomeStatement {
            period_start: start,
            period_end: end,
            income,
            expenses,
            net_income: net_income.into(),
        })
    }

    /// Generates a partner statement.
    ///
    /// `opening_balance` is the amount owed to the partner before `start`;
    /// `activity` is the partner payable movement within the period.
    /// Partner payables are credit-normal, so credits increase what is owed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`.
    pub fn partner_statement(
        partner: PartnerType,
        start: NaiveDate,
        end: NaiveDate,
        opening_balance: Cents,
        activity: &[PartnerActivity],
        settlements: Vec<SettlementSummaryRow>,
    ) -> Result<PartnerStatement, ReportError> {
        Self::validate_range(start, end)?;

        let mut sorted: Vec<&PartnerActivity> = activity.iter().collect();
        sorted.sort_by(|a, b| (a.date, &a.entry_number).cmp(&(b.date, &b.entry_number)));

        let mut running = opening_balance;
        let lines = sorted
            .into_iter()
            .map(|a| {
                running += a.credit - a.debit;
                PartnerStatementLine {
                    date: a.date,
                    entry_number: a.entry_number.clone(),
                    entry_type: a.entry_type.clone(),
                    description: a.description.clone(),
                    account_code: a.account_code.clone(),
                    debit: a.debit.into(),
                    credit: a.credit.into(),
                    running_balance: running.into(),
                }
            })
            .collect();

        Ok(PartnerStatement {
            partner,
            period_start: start,
            period_end: end,
            account_codes: vec![
                partner.service_fee_payable_code().to_string(),
                partner.commission_payable_code().to_string(),
            ],
            opening_balance: opening_balance.into(),
            lines,
            closing_balance: running.into(),
            settlements: Self::settlement_summary(settlements),
        })
    }

    /// Totals settlements by lifecycle bucket. Failed and cancelled ones are
    /// listed but counted in neither total.
    #[must_use]
    pub fn settlement_summary(mut rows: Vec<SettlementSummaryRow>) -> SettlementSummary {
        rows.sort_by(|a, b| a.settlement_number.cmp(&b.settlement_number));
        let mut completed = Cents::ZERO;
        let mut outstanding = Cents::ZERO;
        for row in &rows {
            let amount = Cents(row.amount.cents);
            match row.status {
                SettlementStatus::Completed => completed += amount,
                SettlementStatus::Pending
                | SettlementStatus::Approved
                | SettlementStatus::Processing => outstanding += amount,
                SettlementStatus::Failed | SettlementStatus::Cancelled => {}
            }
        }
        SettlementSummary {
            settlements: rows,
            total_completed: completed.into(),
            total_outstanding: outstanding.into(),
        }
    }

    fn net_of(activities: &[AccountActivity], account_type: AccountType) -> Cents {
        activities
            .iter()
            .filter(|a| a.account_type == account_type)
            .map(AccountActivity::net)
            .sum()
    }

    fn section(activities: &[AccountActivity], account_type: AccountType) -> ReportSection {
        let mut accounts: Vec<ReportLine> = activities
            .iter()
            .filter(|a| a.account_type == account_type)
            .map(|a| ReportLine {
                account_id: a.account_id,
                code: a.code.clone(),
                name: a.name.clone(),
                account_type: a.account_type,
                balance: a.net().into(),
            })
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        let total: Cents = accounts.iter().map(|l| Cents(l.balance.cents)).sum();
        ReportSection {
            total: Amount::from(total),
            accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::SettlementType;
    use premia_shared::types::GlAccountId;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn activity(code: &str, account_type: AccountType, debit: i64, credit: i64) -> AccountActivity {
        AccountActivity {
            account_id: GlAccountId::new(),
            code: code.into(),
            name: format!("Account {code}"),
            account_type,
            debit: Cents(debit),
            credit: Cents(credit),
        }
    }

    /// Activity after one day-1 receipt of 104 800.
    fn day_one() -> Vec<AccountActivity> {
        vec![
            activity("1010", AccountType::Asset, 104_800, 0),
            activity("2010", AccountType::Liability, 0, 100_000),
            activity("2030", AccountType::Liability, 0, 1_200),
            activity("2040", AccountType::Liability, 0, 1_200),
            activity("4010", AccountType::Income, 0, 2_400),
        ]
    }

    #[test]
    fn test_balance_sheet_balances_with_retained_earnings() {
        let sheet = ReportService::balance_sheet(date(15), &day_one());
        assert_eq!(sheet.total_assets.cents, 104_800);
        assert_eq!(sheet.total_liabilities.cents, 102_400);
        assert_eq!(sheet.retained_earnings.cents, 2_400);
        assert_eq!(sheet.total_equity.cents, 2_400);
        assert!(sheet.is_balanced);
        assert_eq!(sheet.liabilities.accounts[0].code, "2010");
    }

    #[test]
    fn test_income_statement() {
        let mut acts = day_one();
        acts.push(activity("5010", AccountType::Expense, 500, 0));
        let stmt = ReportService::income_statement(date(1), date(31), &acts).unwrap();
        assert_eq!(stmt.income.total.cents, 2_400);
        assert_eq!(stmt.expenses.total.cents, 500);
        assert_eq!(stmt.net_income.cents, 1_900);
    }

    #[test]
    fn test_income_statement_rejects_inverted_range() {
        let err = ReportService::income_statement(date(31), date(1), &[]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_empty_range_yields_zero_totals() {
        let stmt = ReportService::income_statement(date(1), date(1), &[]).unwrap();
        assert_eq!(stmt.net_income.cents, 0);
        assert!(stmt.income.accounts.is_empty());
    }

    #[test]
    fn test_partner_statement_running_balance() {
        let activity = vec![
            PartnerActivity {
                date: date(2),
                entry_number: "JE-20260102-0001".into(),
                entry_type: "payment-receipt-daily".into(),
                description: "Daily".into(),
                account_code: "2030".into(),
                debit: Cents::ZERO,
                credit: Cents(100),
            },
            PartnerActivity {
                date: date(1),
                entry_number: "JE-20260101-0001".into(),
                entry_type: "payment-receipt-day1".into(),
                description: "Day one".into(),
                account_code: "2030".into(),
                debit: Cents::ZERO,
                credit: Cents(1_200),
            },
            PartnerActivity {
                date: date(3),
                entry_number: "JE-20260103-0001".into(),
                entry_type: "settlement-payout".into(),
                description: "Payout".into(),
                account_code: "2030".into(),
                debit: Cents(1_000),
                credit: Cents::ZERO,
            },
        ];
        let settlements = vec![SettlementSummaryRow {
            settlement_number: "STL-20260103-0001".into(),
            settlement_type: SettlementType::ServiceFee,
            status: SettlementStatus::Completed,
            period_start: date(1),
            period_end: date(2),
            amount: Cents(1_000).into(),
        }];

        let stmt = ReportService::partner_statement(
            PartnerType::Kba,
            date(1),
            date(31),
            Cents(50),
            &activity,
            settlements,
        )
        .unwrap();

        let running: Vec<i64> = stmt.lines.iter().map(|l| l.running_balance.cents).collect();
        assert_eq!(running, vec![1_250, 1_350, 350]);
        assert_eq!(stmt.closing_balance.cents, 350);
        assert_eq!(stmt.account_codes, vec!["2030", "2050"]);
        assert_eq!(stmt.settlements.total_completed.cents, 1_000);
        assert_eq!(stmt.settlements.total_outstanding.cents, 0);
    }
}
