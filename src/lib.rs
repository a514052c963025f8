mod consts;
mod prelude;
mod types;

pub mod backup;
pub mod calendar;
pub mod config;
pub mod ranking;
pub mod remote;
pub mod storage;
pub mod store;

pub use backup::{ImportError, RestoreError, backup_file_name, export_backup, import_backup};
pub use config::{Config, ConfigError};
pub use consts::*;
pub use ranking::{BirthdayView, DayEntry, MonthGroup, NextBirthday, rank, rank_today};
pub use remote::{RemoteClient, RemoteError, Session};
pub use storage::{MemoryStorage, Storage};
pub use store::{BirthdayStore, StoreError};
pub use types::{Day, Month, ValueError, Year, max_day_in_month};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// All recorded birthdays keyed by person name.
/// Ordered by name, which makes every scan over it deterministic.
pub type BirthdayMap = BTreeMap<String, BirthdayRecord>;

/// A birthday: month and day are always known, the birth year may not be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct BirthdayRecord {
    month: Month,
    day:   Day,
    #[serde(skip_serializing_if = "Option::is_none")]
    year:  Option<Year>,
}

/// Unvalidated wire shape; the day can only be checked once the month is known.
#[derive(Deserialize)]
struct RawRecord {
    month: u8,
    day:   u8,
    #[serde(default)]
    year:  Option<u16>,
}

impl TryFrom<RawRecord> for BirthdayRecord {
    type Error = ValueError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Self::new(raw.month, raw.day, raw.year)
    }
}

impl BirthdayRecord {
    /// Creates a record from raw numbers.
    ///
    /// # Errors
    /// Returns `ValueError` if the month is out of range, the day does not fit
    /// the month, or the year is out of range.
    pub fn new(month: u8, day: u8, year: Option<u16>) -> Result<Self, ValueError> {
        let month = Month::new(month)?;
        let day = Day::new(day, month)?;
        let year = year.map(Year::new).transpose()?;
        Ok(Self::from_parts(month, day, year))
    }

    /// Creates a record from already validated parts
    pub const fn from_parts(month: Month, day: Day, year: Option<Year>) -> Self {
        Self { month, day, year }
    }

    pub const fn month(&self) -> Month {
        self.month
    }

    pub const fn day(&self) -> Day {
        self.day
    }

    pub const fn year(&self) -> Option<Year> {
        self.year
    }

    /// True when `date` has the same month and day, whatever its year.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        u32::from(self.month.get()) == date.month() && u32::from(self.day.get()) == date.day()
    }

    /// Days from `today` until this birthday next comes around.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        calendar::days_until(today, self.month, self.day)
    }
}

impl fmt::Display for BirthdayRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.month.name(),
            calendar::ordinal(u32::from(self.day.get()))
        )?;
        if let Some(year) = self.year {
            write!(f, ", {year}")?;
        }
        Ok(())
    }
}
