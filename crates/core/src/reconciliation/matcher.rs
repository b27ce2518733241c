//! Tiered statement matcher.
//!
//! Tiers run in precedence order across the whole statement: every item gets
//! a chance at an Exact match before any item tries AmountOnly, and so on.
//! A ledger transaction is claimed by at most one item. Within a tier items
//! are visited in statement order and take the first unclaimed candidate.

use premia_shared::types::Cents;

use super::types::{ItemMatch, LedgerTransaction, MatchPolicy, MatchType, StatementItem};

/// Trims and upper-cases a reference for comparison.
#[must_use]
pub fn normalize_reference(reference: &str) -> String {
    reference.trim().to_uppercase()
}

/// Length of the longest common substring, in characters.
#[must_use]
pub fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut best = 0;
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

/// Statement matcher over a fixed policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    policy: MatchPolicy,
}

struct Normalized<'a> {
    reference: String,
    amount: Cents,
    source: &'a LedgerTransaction,
}

impl Matcher {
    /// Creates a matcher.
    #[must_use]
    pub const fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    /// Returns true if `item` matches `candidate` under `tier`.
    fn tier_accepts(&self, tier: MatchType, item_ref: &str, item_amount: Cents, candidate: &Normalized<'_>) -> bool {
        let refs_present = !item_ref.is_empty() && !candidate.reference.is_empty();
        let refs_equal = refs_present && item_ref == candidate.reference;
        let amounts_equal = item_amount == candidate.amount;

        match tier {
            MatchType::Exact => refs_equal && amounts_equal,
            MatchType::AmountOnly => amounts_equal && !refs_equal,
            MatchType::ReferenceOnly => {
                refs_present
                    && !amounts_equal
                    && (item_ref.contains(candidate.reference.as_str())
                        || candidate.reference.contains(item_ref))
            }
            MatchType::Fuzzy => {
                refs_present
                    && (item_amount - candidate.amount).abs() <= self.policy.fuzzy_amount_tolerance
                    && longest_common_substring(item_ref, &candidate.reference)
                        >= self.policy.fuzzy_min_overlap.max(1)
            }
            MatchType::Manual | MatchType::None => false,
        }
    }

    /// Matches every statement item against the ledger transactions.
    ///
    /// Returns one `ItemMatch` per item, in statement order.
    #[must_use]
    pub fn match_items(&self, items: &[StatementItem], ledger: &[LedgerTransaction]) -> Vec<ItemMatch> {
        let candidates: Vec<Normalized<'_>> = ledger
            .iter()
            .map(|t| Normalized {
                reference: normalize_reference(&t.reference),
                amount: t.amount,
                source: t,
            })
            .collect();
        let item_refs: Vec<String> = items.iter().map(|i| normalize_reference(&i.reference)).collect();

        let mut claimed = vec![false; candidates.len()];
        let mut results = vec![ItemMatch::none(); items.len()];

        for tier in MatchType::AUTOMATIC_TIERS {
            for (idx, item) in items.iter().enumerate() {
                if results[idx].is_matched() {
                    continue;
                }
                let found = candidates.iter().enumerate().find(|(ci, c)| {
                    !claimed[*ci] && self.tier_accepts(tier, &item_refs[idx], item.amount, c)
                });
                if let Some((ci, c)) = found {
                    claimed[ci] = true;
                    results[idx] = ItemMatch {
                        transaction_id: Some(c.source.transaction_id.clone()),
                        ledger_amount: Some(c.amount),
                        match_type: tier,
                        confidence: tier.confidence(),
                    };
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use premia_shared::types::JournalEntryId;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn item(reference: &str, amount: i64) -> StatementItem {
        StatementItem {
            reference: reference.into(),
            amount: Cents(amount),
            date: day(),
        }
    }

    fn tx(reference: &str, amount: i64) -> LedgerTransaction {
        LedgerTransaction {
            transaction_id: reference.into(),
            reference: reference.into(),
            amount: Cents(amount),
            date: day(),
            journal_entry_id: JournalEntryId::new(),
        }
    }

    #[test]
    fn test_exact_beats_amount_only() {
        let ledger = vec![tx("MM-OTHER", 8_700), tx("MM-001", 8_700)];
        let result = Matcher::default().match_items(&[item("MM-001", 8_700)], &ledger);
        assert_eq!(result[0].match_type, MatchType::Exact);
        assert_eq!(result[0].confidence, 100);
        assert_eq!(result[0].transaction_id.as_deref(), Some("MM-001"));
    }

    #[test]
    fn test_exact_reserved_before_amount_only_of_earlier_item() {
        // Item 1 could amount-match MM-002, but item 2 owns it exactly.
        let ledger = vec![tx("MM-002", 8_700)];
        let result = Matcher::default().match_items(&[item("XYZ", 8_700), item("MM-002", 8_700)], &ledger);
        assert_eq!(result[1].match_type, MatchType::Exact);
        assert_eq!(result[0].match_type, MatchType::None);
    }

    #[test]
    fn test_reference_only() {
        let ledger = vec![tx("MM-001", 8_700)];
        let result = Matcher::default().match_items(&[item("mm-001 ", 9_000)], &ledger);
        assert_eq!(result[0].match_type, MatchType::ReferenceOnly);
        assert_eq!(result[0].confidence, 70);
    }

    #[test]
    fn test_reference_containment() {
        let ledger = vec![tx("MM-001", 8_700)];
        let result = Matcher::default().match_items(&[item("TXN/MM-001/KE", 10_400)], &ledger);
        assert_eq!(result[0].match_type, MatchType::ReferenceOnly);
    }

    #[test]
    fn test_fuzzy_match() {
        let ledger = vec![tx("MPESA-QX12345", 8_700)];
        let result = Matcher::default().match_items(&[item("QX1234-B", 8_650)], &ledger);
        assert_eq!(result[0].match_type, MatchType::Fuzzy);
        assert_eq!(result[0].confidence, 60);
    }

    #[test]
    fn test_fuzzy_outside_tolerance() {
        let ledger = vec![tx("MPESA-QX12345", 8_700)];
        let result = Matcher::default().match_items(&[item("QX1234-B", 8_500)], &ledger);
        assert_eq!(result[0].match_type, MatchType::None);
        assert_eq!(result[0].confidence, 0);
    }

    #[test]
    fn test_each_transaction_claimed_once() {
        let ledger = vec![tx("MM-001", 8_700)];
        let result = Matcher::default().match_items(&[item("MM-001", 8_700), item("MM-001", 8_700)], &ledger);
        assert_eq!(result[0].match_type, MatchType::Exact);
        assert_eq!(result[1].match_type, MatchType::None);
    }

    #[test]
    fn test_empty_references_never_match_by_reference() {
        let ledger = vec![tx("", 8_700)];
        let result = Matcher::default().match_items(&[item("", 9_000)], &ledger);
        assert_eq!(result[0].match_type, MatchType::None);
    }

    #[test]
    fn test_longest_common_substring() {
        assert_eq!(longest_common_substring("MPESA-QX12345", "QX1234-B"), 6);
        assert_eq!(longest_common_substring("ABC", "XYZ"), 0);
        assert_eq!(longest_common_substring("", "ABC"), 0);
    }
}
