//! Wall-clock access and calendar key derivation.
//!
//! Every store asks a [`Clock`] for "now" instead of calling `Utc::now()`
//! directly, so tests can move time across day and month boundaries with a
//! [`ManualClock`].  All keys are derived in UTC.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Calendar keys
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// UTC calendar date, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn of(at: DateTime<Utc>) -> Self {
        Self(at.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The UTC midnight that ends this day.
    pub fn next_midnight(&self) -> DateTime<Utc> {
        let next = self
            .0
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        next.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// UTC calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// Build a key from explicit parts.  Returns `None` for a month outside
    /// `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn day_key_formats_as_iso_date() {
        assert_eq!(DayKey::of(at(2026, 2, 14, 23, 59)).to_string(), "2026-02-14");
    }

    #[test]
    fn next_midnight_is_start_of_following_day() {
        let key = DayKey::of(at(2026, 2, 28, 13, 5));
        assert_eq!(key.next_midnight(), at(2026, 3, 1, 0, 0));
    }

    #[test]
    fn month_key_formats_with_padding() {
        assert_eq!(MonthKey::of(at(2026, 3, 1, 0, 0)).to_string(), "2026-03");
        assert_eq!(MonthKey::new(2026, 11).unwrap().to_string(), "2026-11");
        assert!(MonthKey::new(2026, 13).is_none());
        assert!(MonthKey::new(2026, 0).is_none());
    }

    #[test]
    fn month_key_changes_across_year_boundary() {
        let dec = MonthKey::of(at(2025, 12, 31, 23, 59));
        let jan = MonthKey::of(at(2026, 1, 1, 0, 0));
        assert_ne!(dec, jan);
        assert!(dec < jan);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(at(2026, 1, 1, 12, 0));
        clock.advance(chrono::Duration::hours(12));
        assert_eq!(clock.now(), at(2026, 1, 2, 0, 0));
        clock.set(at(2030, 6, 1, 0, 0));
        assert_eq!(DayKey::of(clock.now()).to_string(), "2030-06-01");
    }
}
