//! GL account repository: chart of accounts and balance storage.
//!
//! Balances are only ever changed through [`GlAccountRepository::apply_in`],
//! which locks the account row and writes with a version compare-and-swap.

use chrono::Utc;
use premia_core::ledger::{
    AccountStatus, AccountType, ChartNode, GlAccount, TrialBalance, build_hierarchy,
    standard_chart,
};
use premia_shared::types::{Cents, GlAccountId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{gl_accounts, sea_orm_active_enums as stored};

/// Error types for GL account operations.
#[derive(Debug, thiserror::Error)]
pub enum GlAccountError {
    /// Account code already exists.
    #[error("Account code '{0}' already exists")]
    DuplicateAccount(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Account is inactive and rejects postings.
    #[error("Account {0} is inactive")]
    Inactive(String),

    /// Account cannot be deactivated while it carries a balance.
    #[error("Account {code} still has balance {balance}")]
    HasBalance {
        /// Account code.
        code: String,
        /// Remaining balance.
        balance: Cents,
    },

    /// Balance arithmetic overflowed.
    #[error("Balance overflow on account {0}")]
    Overflow(String),

    /// The row changed between lock and write.
    #[error("Concurrent modification detected for account {0}, please retry")]
    ConcurrentModification(GlAccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl GlAccountError {
    /// Returns the error code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Inactive(_) => "ACCOUNT_INACTIVE",
            Self::HasBalance { .. } => "ACCOUNT_HAS_BALANCE",
            Self::Overflow(_) => "AMOUNT_OVERFLOW",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Unique business code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification; the normal balance is derived from it.
    pub account_type: AccountType,
    /// Display parent.
    pub parent_id: Option<GlAccountId>,
}

/// Converts a stored row into the domain snapshot.
pub(crate) fn to_domain(model: gl_accounts::Model) -> GlAccount {
    GlAccount {
        id: GlAccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        account_type: model.account_type.into(),
        normal_balance: model.normal_balance.into(),
        balance: Cents(model.balance),
        status: model.status.into(),
        parent_id: model.parent_id.map(GlAccountId::from_uuid),
    }
}

/// GL account repository.
#[derive(Debug, Clone)]
pub struct GlAccountRepository {
    db: DatabaseConnection,
}

impl GlAccountRepository {
    /// Creates a new GL account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Looks up an account by code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown code.
    pub async fn get_by_code(&self, code: &str) -> Result<GlAccount, GlAccountError> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| GlAccountError::NotFound(code.to_string()))
    }

    /// Looks up an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID.
    pub async fn get_by_id(&self, id: GlAccountId) -> Result<GlAccount, GlAccountError> {
        gl_accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(to_domain)
            .ok_or_else(|| GlAccountError::NotFound(id.to_string()))
    }

    /// Creates an account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the code exists, `NotFound` for an
    /// unknown parent.
    pub async fn create(&self, input: CreateAccountInput) -> Result<GlAccount, GlAccountError> {
        if self.find_by_code(&input.code).await?.is_some() {
            return Err(GlAccountError::DuplicateAccount(input.code));
        }

        if let Some(parent_id) = input.parent_id {
            self.get_by_id(parent_id).await?;
        }

        let now = Utc::now().into();
        let account = gl_accounts::ActiveModel {
            id: Set(GlAccountId::new().into_inner()),
            code: Set(input.code.clone()),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            normal_balance: Set(input.account_type.normal_balance().into()),
            balance: Set(0),
            status: Set(stored::AccountStatus::Active),
            parent_id: Set(input.parent_id.map(GlAccountId::into_inner)),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match account.insert(&self.db).await {
            Ok(model) => {
                tracing::info!(code = %model.code, "GL account created");
                Ok(to_domain(model))
            }
            // Lost a race with a concurrent create of the same code.
            Err(err) if is_unique_violation(&err) => {
                Err(GlAccountError::DuplicateAccount(input.code))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Creates every standard chart account that does not exist yet.
    ///
    /// Returns the number of accounts created.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or insert fails.
    pub async fn seed_standard_chart(&self) -> Result<usize, GlAccountError> {
        let mut created = 0;
        for def in standard_chart() {
            if self.find_by_code(def.code).await?.is_some() {
                continue;
            }
            let parent_id = match def.parent_code {
                Some(code) => Some(self.get_by_code(code).await?.id),
                None => None,
            };
            self.create(CreateAccountInput {
                code: def.code.to_string(),
                name: def.name.to_string(),
                account_type: def.account_type,
                parent_id,
            })
            .await?;
            created += 1;
        }
        tracing::info!(created, "Standard chart seeded");
        Ok(created)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<GlAccount>, DbErr> {
        Ok(gl_accounts::Entity::find()
            .filter(gl_accounts::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .map(to_domain))
    }

    /// Applies a debit/credit pair to an account in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`Self::apply_in`].
    pub async fn update_balance(
        &self,
        account_id: GlAccountId,
        debit: Cents,
        credit: Cents,
    ) -> Result<GlAccount, GlAccountError> {
        let txn = self.db.begin().await?;
        let account = Self::apply_in(&txn, account_id, debit, credit).await?;
        txn.commit().await?;
        Ok(account)
    }

    /// Applies a debit/credit pair to an account inside `txn`.
    ///
    /// The row is read with `SELECT ... FOR UPDATE` and written back only if
    /// its version is unchanged, so concurrent postings never apply a stale
    /// read-modify-write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Inactive`, `Overflow`, or
    /// `ConcurrentModification`.
    pub(crate) async fn apply_in(
        txn: &DatabaseTransaction,
        account_id: GlAccountId,
        debit: Cents,
        credit: Cents,
    ) -> Result<GlAccount, GlAccountError> {
        let model = gl_accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| GlAccountError::NotFound(account_id.to_string()))?;

        if model.status == stored::AccountStatus::Inactive {
            return Err(GlAccountError::Inactive(model.code));
        }

        let normal: premia_core::ledger::NormalBalance = model.normal_balance.into();
        let change = normal.balance_change(debit, credit);
        let new_balance = model
            .balance
            .checked_add(change.get())
            .ok_or_else(|| GlAccountError::Overflow(model.code.clone()))?;

        let result = gl_accounts::Entity::update_many()
            .col_expr(gl_accounts::Column::Balance, Expr::value(new_balance))
            .col_expr(gl_accounts::Column::Version, Expr::value(model.version + 1))
            .col_expr(
                gl_accounts::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(gl_accounts::Column::Id.eq(model.id))
            .filter(gl_accounts::Column::Version.eq(model.version))
            .exec(txn)
            .await?;

        if result.rows_affected != 1 {
            return Err(GlAccountError::ConcurrentModification(account_id));
        }

        tracing::debug!(
            code = %model.code,
            previous = model.balance,
            balance = new_balance,
            "Account balance updated"
        );

        Ok(to_domain(gl_accounts::Model {
            balance: new_balance,
            version: model.version + 1,
            ..model
        }))
    }

    /// Returns every account ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<GlAccount>, GlAccountError> {
        let accounts = gl_accounts::Entity::find()
            .order_by_asc(gl_accounts::Column::Code)
            .all(&self.db)
            .await?;
        Ok(accounts.into_iter().map(to_domain).collect())
    }

    /// Computes the trial balance over active accounts.
    ///
    /// An imbalance is logged and returned as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_trial_balance(&self) -> Result<TrialBalance, GlAccountError> {
        let accounts = self.list().await?;
        let trial_balance = TrialBalance::from_accounts(&accounts);
        if !trial_balance.is_balanced {
            tracing::error!(
                total_debit = trial_balance.total_debit.get(),
                total_credit = trial_balance.total_credit.get(),
                "Trial balance does not balance"
            );
        }
        Ok(trial_balance)
    }

    /// Returns the chart of accounts as a code-ordered hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_chart_of_accounts(&self) -> Result<Vec<ChartNode>, GlAccountError> {
        Ok(build_hierarchy(self.list().await?))
    }

    /// Deactivates an account. Only allowed at zero balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `HasBalance`.
    pub async fn deactivate(&self, account_id: GlAccountId) -> Result<GlAccount, GlAccountError> {
        let txn = self.db.begin().await?;
        let model = gl_accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| GlAccountError::NotFound(account_id.to_string()))?;

        if model.balance != 0 {
            return Err(GlAccountError::HasBalance {
                code: model.code,
                balance: Cents(model.balance),
            });
        }
        if model.status == stored::AccountStatus::Inactive {
            txn.commit().await?;
            return Ok(to_domain(model));
        }

        let mut active: gl_accounts::ActiveModel = model.into();
        active.status = Set(AccountStatus::Inactive.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(code = %updated.code, "GL account deactivated");
        Ok(to_domain(updated))
    }
}

/// Returns true if `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
}
