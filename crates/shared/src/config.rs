//! Application configuration management.
//!
//! Business constants (fee table, commission policy, matching heuristics)
//! live here with defaults so they can be tuned per deployment without a
//! code change.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Posting allocation table.
    #[serde(default)]
    pub posting: PostingConfig,
    /// Commission distribution policy.
    #[serde(default)]
    pub commission: CommissionConfig,
    /// Statement reconciliation settings.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Partner contact directory used for settlement notifications.
    #[serde(default)]
    pub partners: PartnersConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Fixed per-rider service fees charged on every receipt, in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Platform service fee on the day-1 deposit.
    pub day_one_platform_fee_cents: i64,
    /// KBA service fee on the day-1 deposit.
    pub day_one_kba_fee_cents: i64,
    /// ROBS service fee on the day-1 deposit.
    pub day_one_robs_fee_cents: i64,
    /// Platform service fee per covered day.
    pub daily_platform_fee_cents: i64,
    /// KBA service fee per covered day.
    pub daily_kba_fee_cents: i64,
    /// ROBS service fee per covered day.
    pub daily_robs_fee_cents: i64,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            day_one_platform_fee_cents: 2_400,
            day_one_kba_fee_cents: 1_200,
            day_one_robs_fee_cents: 1_200,
            daily_platform_fee_cents: 200,
            daily_kba_fee_cents: 100,
            daily_robs_fee_cents: 100,
        }
    }
}

/// Commission distribution policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommissionConfig {
    /// Gross premium a full-term rider pays (ratio denominator).
    pub gross_premium_cents: i64,
    /// Pure premium share of that gross amount (ratio numerator).
    pub pure_premium_cents: i64,
    /// Commission rate on the pure premium, in basis points.
    pub commission_rate_bps: i64,
    /// Covered days a rider needs to count as full term.
    pub full_term_days: u32,
    /// Fixed platform operations and maintenance component per full-term rider.
    pub platform_om_per_rider_cents: i64,
    /// Fixed partner component per full-term rider, split between KBA and ROBS.
    pub partner_fixed_per_rider_cents: i64,
    /// Platform share of the remaining commission, in basis points.
    pub platform_share_bps: i64,
    /// KBA share of the remaining commission, in basis points.
    pub kba_share_bps: i64,
    /// ROBS share of the remaining commission, in basis points.
    pub robs_share_bps: i64,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            gross_premium_cents: 1_096_000,
            pure_premium_cents: 1_000_000,
            commission_rate_bps: 1_000,
            full_term_days: 121,
            platform_om_per_rider_cents: 30_000,
            partner_fixed_per_rider_cents: 12_525,
            platform_share_bps: 4_000,
            kba_share_bps: 3_000,
            robs_share_bps: 3_000,
        }
    }
}

/// Statement reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Maximum absolute amount difference for a fuzzy match.
    pub fuzzy_amount_tolerance_cents: i64,
    /// Minimum shared reference substring length for a fuzzy match.
    pub fuzzy_min_overlap: usize,
    /// Directory holding `<YYYY-MM-DD>.json` statement files.
    pub statement_dir: String,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            fuzzy_amount_tolerance_cents: 100,
            fuzzy_min_overlap: 4,
            statement_dir: "statements".to_string(),
        }
    }
}

/// Contact details for one settlement counterparty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartnerContact {
    /// Display name.
    pub name: String,
    /// Email address, if any.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number for SMS, if any.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Partner contact directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartnersConfig {
    /// KBA contact.
    pub kba: PartnerContact,
    /// ROBS contact.
    pub robs: PartnerContact,
    /// Internal operators notified on settlement completion.
    pub operators: Vec<String>,
}

impl Default for PartnersConfig {
    fn default() -> Self {
        Self {
            kba: PartnerContact {
                name: "KBA".to_string(),
                ..PartnerContact::default()
            },
            robs: PartnerContact {
                name: "ROBS".to_string(),
                ..PartnerContact::default()
            },
            operators: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `PREMIA__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PREMIA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("PREMIA__DATABASE__URL", Some("sqlite::memory:")),
                (
                    "PREMIA__RECONCILIATION__FUZZY_AMOUNT_TOLERANCE_CENTS",
                    Some("250"),
                ),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.reconciliation.fuzzy_amount_tolerance_cents, 250);
                assert_eq!(config.reconciliation.fuzzy_min_overlap, 4);
                assert_eq!(config.posting, PostingConfig::default());
                assert_eq!(config.commission, CommissionConfig::default());
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("PREMIA__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_default_fee_table_sums_to_deposit_fees() {
        let posting = PostingConfig::default();
        let day_one_fees = posting.day_one_platform_fee_cents
            + posting.day_one_kba_fee_cents
            + posting.day_one_robs_fee_cents;
        assert_eq!(day_one_fees, 4_800);
    }
}
