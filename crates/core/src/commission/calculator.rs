//! Commission distribution calculator.
//!
//! Pure integer arithmetic over a period's rider premiums. The four
//! distribution buckets always sum to `total_commission` exactly; any
//! rounding residue lands on `platform_profit`.

use premia_shared::config::CommissionConfig;
use premia_shared::types::Cents;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CommissionError;

/// Basis points in one whole.
pub const BPS_SCALE: i64 = 10_000;

/// Premium paid by one rider during the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderPremium {
    /// Rider.
    pub rider_id: Uuid,
    /// Premium collected (net of service fees).
    pub total_premium: Cents,
    /// Whether the rider reached the full-term day count.
    pub full_term_completed: bool,
}

/// Commission policy constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionPolicy {
    /// Ratio numerator (pure premium per full-term rider).
    pub ratio_numerator: i64,
    /// Ratio denominator (gross premium per full-term rider).
    pub ratio_denominator: i64,
    /// Commission rate on pure premium, in basis points.
    pub commission_rate_bps: i64,
    /// Covered days that make a rider full-term.
    pub full_term_days: u32,
    /// Fixed platform O&M per full-term rider.
    pub platform_om_per_rider: Cents,
    /// Fixed partner component per full-term rider.
    pub partner_fixed_per_rider: Cents,
    /// Platform share of the remaining commission, in basis points.
    pub platform_share_bps: i64,
    /// KBA share of the remaining commission, in basis points.
    pub kba_share_bps: i64,
    /// ROBS share of the remaining commission, in basis points.
    pub robs_share_bps: i64,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self::from(&CommissionConfig::default())
    }
}

impl From<&CommissionConfig> for CommissionPolicy {
    fn from(config: &CommissionConfig) -> Self {
        Self {
            ratio_numerator: config.pure_premium_cents,
            ratio_denominator: config.gross_premium_cents,
            commission_rate_bps: config.commission_rate_bps,
            full_term_days: config.full_term_days,
            platform_om_per_rider: Cents(config.platform_om_per_rider_cents),
            partner_fixed_per_rider: Cents(config.partner_fixed_per_rider_cents),
            platform_share_bps: config.platform_share_bps,
            kba_share_bps: config.kba_share_bps,
            robs_share_bps: config.robs_share_bps,
        }
    }
}

impl CommissionPolicy {
    /// Checks the policy is internally consistent.
    ///
    /// # Errors
    ///
    /// `InvalidPolicy` describing the first problem found.
    pub fn check(&self) -> Result<(), CommissionError> {
        if self.ratio_denominator <= 0 || self.ratio_numerator < 0 {
            return Err(CommissionError::InvalidPolicy("premium ratio"));
        }
        if !(0..=BPS_SCALE).contains(&self.commission_rate_bps) {
            return Err(CommissionError::InvalidPolicy("commission rate"));
        }
        if self.platform_om_per_rider.is_negative() || self.partner_fixed_per_rider.is_negative() {
            return Err(CommissionError::InvalidPolicy("fixed components"));
        }
        let shares = [self.platform_share_bps, self.kba_share_bps, self.robs_share_bps];
        if shares.iter().any(|s| *s < 0) || shares.iter().sum::<i64>() != BPS_SCALE {
            return Err(CommissionError::InvalidPolicy("share split"));
        }
        Ok(())
    }

    /// Returns true if a rider with `days` covered days is full-term.
    #[must_use]
    pub const fn is_full_term(&self, days: u32) -> bool {
        days >= self.full_term_days
    }
}

/// Final commission buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDistribution {
    /// Fixed platform operations and maintenance component.
    pub platform_om: Cents,
    /// Platform share of the remaining commission plus rounding residue.
    pub platform_profit: Cents,
    /// KBA total (fixed plus share).
    pub kba: Cents,
    /// ROBS total (fixed plus share).
    pub robs: Cents,
}

impl CommissionDistribution {
    /// Sum of the four buckets.
    #[must_use]
    pub fn sum(&self) -> Cents {
        self.platform_om + self.platform_profit + self.kba + self.robs
    }
}

/// Full calculation trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionResult {
    /// Riders in the input.
    pub rider_count: u64,
    /// Riders that completed the full term.
    pub full_term_riders: u64,
    /// Sum of rider premiums.
    pub total_premium: Cents,
    /// Pure premium after applying the ratio.
    pub pure_premium: Cents,
    /// Commission on pure premium.
    pub total_commission: Cents,
    /// Fixed partner component before the KBA/ROBS split.
    pub partner_fixed: Cents,
    /// KBA half of the fixed partner component.
    pub kba_fixed: Cents,
    /// ROBS half of the fixed partner component (gets the odd cent).
    pub robs_fixed: Cents,
    /// Commission left after fixed components.
    pub remaining_commission: Cents,
    /// KBA share of the remaining commission.
    pub kba_share: Cents,
    /// ROBS share of the remaining commission.
    pub robs_share: Cents,
    /// Final buckets.
    pub distribution: CommissionDistribution,
}

/// Multiplies `value * num / den` rounding half up, with i128 intermediates.
///
/// Callers guarantee `value >= 0`, `num >= 0`, `den > 0`.
fn mul_div_half_up(value: i64, num: i64, den: i64) -> Option<i64> {
    let product = i128::from(value) * i128::from(num);
    let den = i128::from(den);
    let rounded = (2 * product + den) / (2 * den);
    i64::try_from(rounded).ok()
}

/// Multiplies `value * num / den` rounding down.
fn mul_div_floor(value: i64, num: i64, den: i64) -> Option<i64> {
    let product = i128::from(value) * i128::from(num);
    i64::try_from(product / i128::from(den)).ok()
}

/// Stateless commission calculator.
pub struct CommissionCalculator;

impl CommissionCalculator {
    /// Computes the distribution and self-checks it.
    ///
    /// # Errors
    ///
    /// `InvalidPolicy`, `NegativePremium`, `Overflow`, or `ValidationFailed`
    /// if the self-check finds a discrepancy.
    pub fn calculate(
        riders: &[RiderPremium],
        policy: &CommissionPolicy,
    ) -> Result<CommissionResult, CommissionError> {
        policy.check()?;

        let mut total_premium = Cents::ZERO;
        for rider in riders {
            if rider.total_premium.is_negative() {
                return Err(CommissionError::NegativePremium(rider.rider_id));
            }
            total_premium = total_premium
                .checked_add(rider.total_premium)
                .ok_or(CommissionError::Overflow)?;
        }

        let pure_premium = mul_div_half_up(
            total_premium.get(),
            policy.ratio_numerator,
            policy.ratio_denominator,
        )
        .map(Cents)
        .ok_or(CommissionError::Overflow)?;
        let total_commission = mul_div_half_up(pure_premium.get(), policy.commission_rate_bps, BPS_SCALE)
            .map(Cents)
            .ok_or(CommissionError::Overflow)?;

        let full_term_riders = riders.iter().filter(|r| r.full_term_completed).count() as u64;
        let n = i64::try_from(full_term_riders).map_err(|_| CommissionError::Overflow)?;

        let om_due = policy
            .platform_om_per_rider
            .checked_mul(n)
            .ok_or(CommissionError::Overflow)?;
        let partner_due = policy
            .partner_fixed_per_rider
            .checked_mul(n)
            .ok_or(CommissionError::Overflow)?;

        // Fixed components never exceed what was earned: O&M first, then partners.
        let platform_om = om_due.min(total_commission);
        let partner_fixed = partner_due.min(total_commission - platform_om);
        let kba_fixed = Cents(partner_fixed.get() / 2);
        let robs_fixed = partner_fixed - kba_fixed;

        let remaining_commission = total_commission - platform_om - partner_fixed;
        let kba_share = mul_div_floor(remaining_commission.get(), policy.kba_share_bps, BPS_SCALE)
            .map(Cents)
            .ok_or(CommissionError::Overflow)?;
        let robs_share = mul_div_floor(remaining_commission.get(), policy.robs_share_bps, BPS_SCALE)
            .map(Cents)
            .ok_or(CommissionError::Overflow)?;
        let platform_profit = remaining_commission - kba_share - robs_share;

        let result = CommissionResult {
            rider_count: riders.len() as u64,
            full_term_riders,
            total_premium,
            pure_premium,
            total_commission,
            partner_fixed,
            kba_fixed,
            robs_fixed,
            remaining_commission,
            kba_share,
            robs_share,
            distribution: CommissionDistribution {
                platform_om,
                platform_profit,
                kba: kba_fixed + kba_share,
                robs: robs_fixed + robs_share,
            },
        };

        let discrepancies = Self::validate(&result, policy);
        if discrepancies.is_empty() {
            Ok(result)
        } else {
            Err(CommissionError::ValidationFailed(discrepancies))
        }
    }

    /// Re-derives every figure of a result and lists discrepancies.
    ///
    /// Intermediate roundings may differ from an exact rational derivation by
    /// at most one cent; the distribution must sum to `total_commission`
    /// exactly. An empty list means the result is consistent.
    #[must_use]
    pub fn validate(result: &CommissionResult, policy: &CommissionPolicy) -> Vec<String> {
        let mut issues = Vec::new();
        let within_cent = |actual: Cents, num: i128, den: i128| -> bool {
            // |actual - num/den| <= 1  <=>  |actual*den - num| <= den
            (i128::from(actual.get()) * den - num).abs() <= den
        };

        if policy.ratio_denominator > 0
            && !within_cent(
                result.pure_premium,
                i128::from(result.total_premium.get()) * i128::from(policy.ratio_numerator),
                i128::from(policy.ratio_denominator),
            )
        {
            issues.push(format!(
                "pure premium {} does not match total premium {} x {}/{}",
                result.pure_premium,
                result.total_premium,
                policy.ratio_numerator,
                policy.ratio_denominator
            ));
        }

        if !within_cent(
            result.total_commission,
            i128::from(result.pure_premium.get()) * i128::from(policy.commission_rate_bps),
            i128::from(BPS_SCALE),
        ) {
            issues.push(format!(
                "total commission {} does not match {} bps of pure premium {}",
                result.total_commission, policy.commission_rate_bps, result.pure_premium
            ));
        }

        let d = &result.distribution;
        if d.sum() != result.total_commission {
            issues.push(format!(
                "distribution sums to {} but total commission is {}",
                d.sum(),
                result.total_commission
            ));
        }

        for (name, value) in [
            ("platform_om", d.platform_om),
            ("platform_profit", d.platform_profit),
            ("kba", d.kba),
            ("robs", d.robs),
        ] {
            if value.is_negative() {
                issues.push(format!("{name} is negative: {value}"));
            }
        }

        if result.kba_fixed + result.robs_fixed != result.partner_fixed
            || (result.robs_fixed - result.kba_fixed).abs() > Cents(1)
        {
            issues.push(format!(
                "fixed partner split {} / {} does not halve {}",
                result.kba_fixed, result.robs_fixed, result.partner_fixed
            ));
        }

        for (name, share, bps) in [
            ("kba", result.kba_share, policy.kba_share_bps),
            ("robs", result.robs_share, policy.robs_share_bps),
        ] {
            if !within_cent(
                share,
                i128::from(result.remaining_commission.get()) * i128::from(bps),
                i128::from(BPS_SCALE),
            ) {
                issues.push(format!(
                    "{name} share {share} is not {bps} bps of remaining {}",
                    result.remaining_commission
                ));
            }
        }

        issues
    }
}
