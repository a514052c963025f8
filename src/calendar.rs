//! Month names, ordinal days and next-occurrence arithmetic.

use chrono::{Datelike, Days, Local, NaiveDate};

use crate::consts::MONTH_NAMES;
use crate::types::{Day, Month};

/// English name of a month.
pub fn month_name(month: Month) -> &'static str {
    MONTH_NAMES[usize::from(month.get())]
}

/// Formats a day number with its English ordinal suffix ("1st", "12th", "23rd").
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (1, tens) if tens != 11 => "st",
        (2, tens) if tens != 12 => "nd",
        (3, tens) if tens != 13 => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// The host's current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Builds `month`/`day` in `year`. A day past the end of the month rolls
/// forward, so Feb 29 in a non-leap year lands on March 1.
pub fn normalized_date(year: i32, month: Month, day: Day) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, u32::from(month.get()), 1)?
        .checked_add_days(Days::new(u64::from(day.get()) - 1))
}

/// Next date on or after `today` that falls on `month`/`day`.
pub fn next_occurrence(today: NaiveDate, month: Month, day: Day) -> Option<NaiveDate> {
    let this_year = normalized_date(today.year(), month, day)?;
    if this_year >= today {
        Some(this_year)
    } else {
        normalized_date(today.year() + 1, month, day)
    }
}

/// Whole calendar days from `today` to the next occurrence of `month`/`day`.
/// Zero when the birthday is today.
pub fn days_until(today: NaiveDate, month: Month, day: Day) -> i64 {
    // Only unrepresentable years (far outside chrono's range) have no next occurrence
    next_occurrence(today, month, day).map_or(i64::MAX, |next| (next - today).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn md(month: u8, day: u8) -> (Month, Day) {
        let month = Month::new(month).unwrap();
        (month, Day::new(day, month).unwrap())
    }

    #[test]
    fn test_ordinal_table() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (30, "30th"),
            (31, "31st"),
            (111, "111th"),
        ];
        for (day, expected) in cases {
            assert_eq!(ordinal(day), expected, "ordinal({day})");
        }
    }

    #[test]
    fn test_month_names() {
        let names: Vec<&str> = (1..=12)
            .map(|m| month_name(Month::new(m).unwrap()))
            .collect();
        assert_eq!(names[0], "January");
        assert_eq!(names[1], "February");
        assert_eq!(names[8], "September");
        assert_eq!(names[11], "December");
    }

    #[test]
    fn test_days_until_year_wrap() {
        let (m, d) = md(1, 1);
        assert_eq!(days_until(date(2026, 12, 31), m, d), 1);
    }

    #[test]
    fn test_days_until_today_is_zero() {
        let (m, d) = md(10, 19);
        assert_eq!(days_until(date(2026, 10, 19), m, d), 0);
    }

    #[test]
    fn test_days_until_passed_this_year() {
        let (m, d) = md(10, 18);
        // 2027 is not a leap year
        assert_eq!(days_until(date(2026, 10, 19), m, d), 364);
    }

    #[test]
    fn test_leap_day_normalizes_in_non_leap_year() {
        let (m, d) = md(2, 29);
        assert_eq!(normalized_date(2026, m, d), Some(date(2026, 3, 1)));
        assert_eq!(normalized_date(2028, m, d), Some(date(2028, 2, 29)));
        assert_eq!(days_until(date(2026, 2, 1), m, d), 28);
        assert_eq!(days_until(date(2028, 2, 1), m, d), 28);
    }

    #[test]
    fn test_leap_day_after_normalized_date_wraps_to_next_year() {
        let (m, d) = md(2, 29);
        // 2027-03-01 is the normalized occurrence after 2026-03-02
        assert_eq!(
            next_occurrence(date(2026, 3, 2), m, d),
            Some(date(2027, 3, 1))
        );
    }

    proptest! {
        #[test]
        fn prop_ordinal_suffix(day in 1u32..=366) {
            let text = ordinal(day);
            prop_assert!(text.starts_with(&day.to_string()));
            let suffix = &text[day.to_string().len()..];
            if (11..=13).contains(&(day % 100)) {
                prop_assert_eq!(suffix, "th");
            } else {
                let expected = match day % 10 {
                    1 => "st",
                    2 => "nd",
                    3 => "rd",
                    _ => "th",
                };
                prop_assert_eq!(suffix, expected);
            }
        }

        #[test]
        fn prop_days_until_within_a_year(
            offset in 0u64..3000,
            month in 1u8..=12,
            day in 1u8..=28,
        ) {
            let today = date(2020, 1, 1).checked_add_days(Days::new(offset)).unwrap();
            let (m, d) = md(month, day);
            let days = days_until(today, m, d);
            prop_assert!((0..=365).contains(&days));
        }
    }
}
