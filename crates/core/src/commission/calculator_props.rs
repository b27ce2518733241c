//! Property-based tests for the commission calculator.

use premia_shared::types::Cents;
use proptest::prelude::*;
use uuid::Uuid;

use super::calculator::{CommissionCalculator, CommissionPolicy, RiderPremium};

/// Strategy for a rider: premium up to one full term and a full-term flag.
fn arb_rider() -> impl Strategy<Value = RiderPremium> {
    (0i64..=1_200_000, any::<bool>(), any::<u128>()).prop_map(|(premium, full, id)| RiderPremium {
        rider_id: Uuid::from_u128(id),
        total_premium: Cents(premium),
        full_term_completed: full,
    })
}

/// Strategy for share splits that sum to 10 000 bps.
fn arb_policy() -> impl Strategy<Value = CommissionPolicy> {
    (0i64..=10_000, 0i64..=10_000, 0i64..=2_000).prop_map(|(a, b, rate)| {
        let platform = a.min(b);
        let kba = a.max(b) - platform;
        let robs = 10_000 - platform - kba;
        CommissionPolicy {
            commission_rate_bps: rate,
            platform_share_bps: platform,
            kba_share_bps: kba,
            robs_share_bps: robs,
            ..CommissionPolicy::default()
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The four buckets always add up to the total commission, exactly.
    #[test]
    fn prop_distribution_sums_exactly(
        riders in prop::collection::vec(arb_rider(), 0..40),
        policy in arb_policy(),
    ) {
        let result = CommissionCalculator::calculate(&riders, &policy).unwrap();
        prop_assert_eq!(result.distribution.sum(), result.total_commission);
        prop_assert!(CommissionCalculator::validate(&result, &policy).is_empty());
    }

    /// No bucket ever goes negative.
    #[test]
    fn prop_buckets_non_negative(riders in prop::collection::vec(arb_rider(), 0..40)) {
        let result = CommissionCalculator::calculate(&riders, &CommissionPolicy::default()).unwrap();
        let d = result.distribution;
        prop_assert!(!d.platform_om.is_negative());
        prop_assert!(!d.platform_profit.is_negative());
        prop_assert!(!d.kba.is_negative());
        prop_assert!(!d.robs.is_negative());
    }

    /// Rounding residue goes to the platform: partners never exceed their exact share.
    #[test]
    fn prop_partner_shares_floor(riders in prop::collection::vec(arb_rider(), 1..40)) {
        let policy = CommissionPolicy::default();
        let result = CommissionCalculator::calculate(&riders, &policy).unwrap();
        let remaining = i128::from(result.remaining_commission.get());
        prop_assert!(i128::from(result.kba_share.get()) * 10_000 <= remaining * i128::from(policy.kba_share_bps));
        prop_assert!(i128::from(result.robs_share.get()) * 10_000 <= remaining * i128::from(policy.robs_share_bps));
    }
}
