//! Due-date arithmetic
//!
//! No holiday calendar and no time zones: dates are plain calendar days.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Whether `date` falls on Monday to Friday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Compute the due date of a rule.
///
/// In calendar mode the result is `reference + days_limit`. In business mode
/// the walk starts the day after `reference` and counts only weekdays until
/// `days_limit` of them have been seen; the reference date itself never
/// counts. A limit of zero returns `reference` in both modes.
///
/// Results past `NaiveDate::MAX` saturate.
pub fn compute_due_date(reference: NaiveDate, days_limit: u32, business_days: bool) -> NaiveDate {
    if !business_days {
        return reference
            .checked_add_days(Days::new(u64::from(days_limit)))
            .unwrap_or(NaiveDate::MAX);
    }

    let mut current = reference;
    let mut counted = 0;
    while counted < days_limit {
        current = match current.succ_opt() {
            Some(next) => next,
            None => return NaiveDate::MAX,
        };
        if is_business_day(current) {
            counted += 1;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_days() {
        assert_eq!(compute_due_date(date(2025, 12, 1), 30, false), date(2025, 12, 31));
        assert_eq!(compute_due_date(date(2025, 12, 1), 45, false), date(2026, 1, 15));
    }

    #[test]
    fn test_zero_days_returns_reference() {
        let friday = date(2025, 12, 12);
        let saturday = date(2025, 12, 13);
        assert_eq!(compute_due_date(friday, 0, false), friday);
        assert_eq!(compute_due_date(friday, 0, true), friday);
        // Not moved to a weekday
        assert_eq!(compute_due_date(saturday, 0, true), saturday);
    }

    #[test]
    fn test_business_days_across_year_end() {
        // Friday + 15 business days
        assert_eq!(compute_due_date(date(2025, 12, 12), 15, true), date(2026, 1, 2));
    }

    #[test]
    fn test_business_days_from_friday_skips_weekend() {
        assert_eq!(compute_due_date(date(2025, 12, 12), 1, true), date(2025, 12, 15));
    }

    #[test]
    fn test_business_days_from_weekend_reference() {
        // Saturday and Sunday references both land on the following Monday
        assert_eq!(compute_due_date(date(2025, 12, 13), 1, true), date(2025, 12, 15));
        assert_eq!(compute_due_date(date(2025, 12, 14), 1, true), date(2025, 12, 15));
    }

    #[test]
    fn test_business_days_full_week() {
        // Monday + 5 business days is the next Monday
        assert_eq!(compute_due_date(date(2025, 12, 1), 5, true), date(2025, 12, 8));
    }

    #[test]
    fn test_saturates_at_max() {
        assert_eq!(compute_due_date(NaiveDate::MAX, 1, false), NaiveDate::MAX);
        assert_eq!(compute_due_date(NaiveDate::MAX, 1, true), NaiveDate::MAX);
    }

    #[test]
    fn test_is_business_day() {
        assert!(is_business_day(date(2025, 12, 12)));
        assert!(!is_business_day(date(2025, 12, 13)));
        assert!(!is_business_day(date(2025, 12, 14)));
    }
}
