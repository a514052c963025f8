//! Display ordering for the birthday list.
//!
//! Birthdays are grouped by month (January first) and sorted by day within
//! each month. Anyone whose birthday is today is flagged; only when nobody
//! is, the single closest upcoming birthday is flagged instead.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::calendar;
use crate::{BirthdayMap, Day, Month};

/// One row of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub name:     String,
    pub day:      Day,
    /// Day with its ordinal suffix, e.g. "21st"
    pub ordinal:  String,
    pub is_today: bool,
    pub is_next:  bool,
}

/// All birthdays falling in one month, sorted by day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    pub month:            Month,
    pub name:             &'static str,
    pub is_current_month: bool,
    pub entries:          Vec<DayEntry>,
}

/// The closest birthday after today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextBirthday {
    pub name:      String,
    pub days_away: i64,
}

/// Derived, read-only view of a `BirthdayMap` as of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthdayView {
    pub today:  NaiveDate,
    pub groups: Vec<MonthGroup>,
    /// Names whose birthday is today
    pub todays: BTreeSet<String>,
    /// Set only when `todays` is empty and there is at least one birthday
    pub next:   Option<NextBirthday>,
}

impl BirthdayView {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn is_today(&self, name: &str) -> bool {
        self.todays.contains(name)
    }

    pub fn is_next(&self, name: &str) -> bool {
        self.next.as_ref().is_some_and(|next| next.name == name)
    }

    /// Every entry in display order.
    pub fn entries(&self) -> impl Iterator<Item = &DayEntry> {
        self.groups.iter().flat_map(|group| group.entries.iter())
    }
}

/// Ranks `map` as seen from the host's current local day.
pub fn rank_today(map: &BirthdayMap) -> BirthdayView {
    rank(map, calendar::today())
}

/// Ranks `map` as seen from `today`.
pub fn rank(map: &BirthdayMap, today: NaiveDate) -> BirthdayView {
    let todays: BTreeSet<String> = map
        .iter()
        .filter(|(_, record)| record.falls_on(today))
        .map(|(name, _)| name.clone())
        .collect();

    // Map iteration is by name, so equal distances resolve alphabetically
    let next = if todays.is_empty() {
        map.iter()
            .map(|(name, record)| (record.days_until(today), name))
            .min_by_key(|(days_away, _)| *days_away)
            .map(|(days_away, name)| NextBirthday {
                name: name.clone(),
                days_away,
            })
    } else {
        None
    };

    let mut buckets: BTreeMap<Month, Vec<DayEntry>> = BTreeMap::new();
    for (name, record) in map {
        buckets.entry(record.month()).or_default().push(DayEntry {
            name:     name.clone(),
            day:      record.day(),
            ordinal:  calendar::ordinal(u32::from(record.day().get())),
            is_today: todays.contains(name),
            is_next:  next.as_ref().is_some_and(|n| &n.name == name),
        });
    }

    let groups = buckets
        .into_iter()
        .map(|(month, mut entries)| {
            // Stable sort keeps same-day names in alphabetical order
            entries.sort_by_key(|entry| entry.day);
            MonthGroup {
                month,
                name: month.name(),
                is_current_month: u32::from(month.get()) == today.month(),
                entries,
            }
        })
        .collect();

    BirthdayView {
        today,
        groups,
        todays,
        next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BirthdayRecord;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn map_of(entries: &[(&str, u8, u8)]) -> BirthdayMap {
        entries
            .iter()
            .map(|&(name, month, day)| {
                (
                    name.to_owned(),
                    BirthdayRecord::new(month, day, None).unwrap(),
                )
            })
            .collect()
    }

    fn layout(view: &BirthdayView) -> Vec<(u8, Vec<(&str, u8)>)> {
        view.groups
            .iter()
            .map(|group| {
                (
                    group.month.get(),
                    group
                        .entries
                        .iter()
                        .map(|e| (e.name.as_str(), e.day.get()))
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_map() {
        let view = rank(&BirthdayMap::new(), date(2026, 10, 19));
        assert!(view.is_empty());
        assert!(view.todays.is_empty());
        assert_eq!(view.next, None);
        assert_eq!(view.entries().count(), 0);
    }

    #[test]
    fn test_grouping_and_sorting() {
        let map = map_of(&[("A", 3, 10), ("B", 1, 5), ("C", 1, 1)]);
        let view = rank(&map, date(2026, 6, 1));

        assert_eq!(
            layout(&view),
            vec![(1, vec![("C", 1), ("B", 5)]), (3, vec![("A", 10)])]
        );
        assert_eq!(view.groups[0].name, "January");
        assert_eq!(view.groups[1].name, "March");
        assert_eq!(view.entries().map(|e| e.ordinal.as_str()).collect::<Vec<_>>(), [
            "1st", "5th", "10th"
        ]);
    }

    #[test]
    fn test_same_day_keeps_name_order() {
        let map = map_of(&[("Zed", 5, 2), ("Amy", 5, 2), ("Bea", 5, 1)]);
        let view = rank(&map, date(2026, 1, 1));
        assert_eq!(
            layout(&view),
            vec![(5, vec![("Bea", 1), ("Amy", 2), ("Zed", 2)])]
        );
    }

    #[test]
    fn test_next_upcoming_with_year_wrap() {
        let map = map_of(&[("NewYear", 1, 1), ("Later", 3, 1)]);
        let view = rank(&map, date(2026, 12, 31));

        assert!(view.todays.is_empty());
        assert_eq!(
            view.next,
            Some(NextBirthday {
                name:      "NewYear".to_owned(),
                days_away: 1,
            })
        );
        assert!(view.is_next("NewYear"));
        assert!(!view.is_next("Later"));
    }

    #[test]
    fn test_todays_birthdays_suppress_next() {
        let map = map_of(&[("Ann", 10, 19), ("Ben", 10, 19), ("Cal", 10, 20)]);
        let view = rank(&map, date(2026, 10, 19));

        assert_eq!(
            view.todays.iter().map(String::as_str).collect::<Vec<_>>(),
            ["Ann", "Ben"]
        );
        assert_eq!(view.next, None);

        let flags: Vec<(&str, bool, bool)> = view
            .entries()
            .map(|e| (e.name.as_str(), e.is_today, e.is_next))
            .collect();
        assert_eq!(flags, [
            ("Ann", true, false),
            ("Ben", true, false),
            ("Cal", false, false)
        ]);
    }

    #[test]
    fn test_next_tie_breaks_alphabetically() {
        let map = map_of(&[("Zoe", 11, 2), ("Abe", 11, 2), ("Max", 12, 1)]);
        let view = rank(&map, date(2026, 10, 19));
        assert_eq!(view.next.map(|n| n.name), Some("Abe".to_owned()));
    }

    #[test]
    fn test_next_prefers_later_this_year_over_passed() {
        let map = map_of(&[("Passed", 10, 18), ("Soon", 10, 25)]);
        let view = rank(&map, date(2026, 10, 19));
        assert_eq!(
            view.next,
            Some(NextBirthday {
                name:      "Soon".to_owned(),
                days_away: 6,
            })
        );
    }

    #[test]
    fn test_leap_day_in_non_leap_year() {
        let map = map_of(&[("Leap", 2, 29)]);
        let view = rank(&map, date(2026, 2, 20));
        // 2026-02-29 rolls into 2026-03-01
        assert_eq!(view.next.map(|n| n.days_away), Some(9));
    }

    #[test]
    fn test_leap_day_observed_on_march_first() {
        let map = map_of(&[("Leap", 2, 29), ("Later", 3, 5)]);
        let view = rank(&map, date(2026, 3, 1));
        // Not today by month and day, but its observed date is today
        assert!(view.todays.is_empty());
        assert_eq!(
            view.next,
            Some(NextBirthday {
                name:      "Leap".to_owned(),
                days_away: 0,
            })
        );
        assert!(view.is_next("Leap"));
    }

    #[test]
    fn test_current_month_flag() {
        let map = map_of(&[("A", 10, 1), ("B", 11, 1)]);
        let view = rank(&map, date(2026, 10, 19));
        let flags: Vec<bool> = view.groups.iter().map(|g| g.is_current_month).collect();
        assert_eq!(flags, [true, false]);
    }
}
