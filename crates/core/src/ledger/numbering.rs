//! Date-prefixed human readable document numbers.
//!
//! Format: `{PREFIX}-YYYYMMDD-NNNN`, sequence starting at 1 per day.

use chrono::NaiveDate;

/// Document kinds that carry a sequential number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Journal entries (`JE`).
    JournalEntry,
    /// Partner settlements (`STL`).
    Settlement,
    /// Rider refunds (`RF`).
    Refund,
}

impl NumberKind {
    /// Returns the document prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::JournalEntry => "JE",
            Self::Settlement => "STL",
            Self::Refund => "RF",
        }
    }
}

/// Returns the shared prefix for a given day, e.g. `JE-20260115-`.
#[must_use]
pub fn day_prefix(kind: NumberKind, date: NaiveDate) -> String {
    format!("{}-{}-", kind.prefix(), date.format("%Y%m%d"))
}

/// Formats a full number for the given day and sequence.
#[must_use]
pub fn format_number(kind: NumberKind, date: NaiveDate, sequence: u64) -> String {
    format!("{}{sequence:04}", day_prefix(kind, date))
}

/// Next number given how many already exist for the same day.
#[must_use]
pub fn next_number(kind: NumberKind, date: NaiveDate, existing_for_day: u64) -> String {
    format_number(kind, date, existing_for_day + 1)
}

/// Extracts the sequence part of a formatted number.
#[must_use]
pub fn parse_sequence(number: &str) -> Option<u64> {
    number.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(
            format_number(NumberKind::JournalEntry, day(), 1),
            "JE-20260115-0001"
        );
        assert_eq!(
            format_number(NumberKind::Settlement, day(), 42),
            "STL-20260115-0042"
        );
        assert_eq!(format_number(NumberKind::Refund, day(), 7), "RF-20260115-0007");
    }

    #[test]
    fn test_next_number_follows_count() {
        assert_eq!(
            next_number(NumberKind::JournalEntry, day(), 0),
            "JE-20260115-0001"
        );
        assert_eq!(
            next_number(NumberKind::JournalEntry, day(), 9),
            "JE-20260115-0010"
        );
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("JE-20260115-0012"), Some(12));
        assert_eq!(parse_sequence("garbage"), None);
    }

    #[test]
    fn test_day_prefix() {
        assert_eq!(day_prefix(NumberKind::Settlement, day()), "STL-20260115-");
    }
}
