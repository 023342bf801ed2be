//! Coarse calendar dates as used by cladogram records.
//!
//! Dates are `year[.month[.day]]` triples on a configurable calendar (months per year, days per
//! month). Components that were not given are stored as `0` and remembered as unset so they can
//! be written back the way they were read.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// Month/day granularity of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub months_in_year: i32,
    pub days_in_month: i32,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            months_in_year: 12,
            days_in_month: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Date {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    month_set: bool,
    day_set: bool,
}

impl Date {
    pub fn ymd(year: i32, month: i32, day: i32) -> Self {
        Self {
            year,
            month,
            day,
            month_set: month != 0,
            day_set: day != 0,
        }
    }

    pub fn ym(year: i32, month: i32) -> Self {
        Self::ymd(year, month, 0)
    }

    pub fn year(year: i32) -> Self {
        Self::ymd(year, 0, 0)
    }

    /// `true` for the all-zero date, which records use to mean "not given".
    pub fn is_unset(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }

    pub fn month_set(&self) -> bool {
        self.month_set
    }

    pub fn day_set(&self) -> bool {
        self.day_set
    }

    /// Month/day `0` means "start of unit"; replace it with `1`.
    ///
    /// The set flags are kept, so `2000` still prints as `2000` afterwards.
    pub fn normalized(mut self) -> Self {
        if self.month == 0 {
            self.month = 1;
        }
        if self.day == 0 {
            self.day = 1;
        }
        self
    }

    /// Rolls day overflow into months and month overflow into years.
    ///
    /// Only meant for comparisons: with 30-day months `2000.1.31` and `2000.2.1` become equal.
    pub fn resolve_overflow(mut self, calendar: Calendar) -> Self {
        if calendar.days_in_month > 0 {
            while self.day > calendar.days_in_month {
                self.month += 1;
                self.day -= calendar.days_in_month;
            }
        }
        if calendar.months_in_year > 0 {
            while self.month > calendar.months_in_year {
                self.year += 1;
                self.month -= calendar.months_in_year;
            }
        }
        self
    }

    /// Horizontal pixel position of this date on a timeline starting at `origin_year`.
    pub fn px(&self, origin_year: i32, year_px: i32, calendar: Calendar) -> i32 {
        let month_px = year_px as f32 / calendar.months_in_year.max(1) as f32;
        let day_px = year_px as f32
            / (calendar.months_in_year.max(1) * calendar.days_in_month.max(1)) as f32;
        let month = (self.month - 1).max(0);
        let day = (self.day - 1).max(0);
        (self.year - origin_year) * year_px + (month as f32 * month_px) as i32
            + (day as f32 * day_px) as i32
    }

    fn key(&self) -> (i32, i32, i32) {
        (self.year, self.month, self.day)
    }

    /// Today's date (UTC), the default end of the timeline.
    pub fn today() -> Self {
        use chrono::Datelike;
        let now = chrono::Utc::now().date_naive();
        Self::ymd(now.year(), now.month() as i32, now.day() as i32)
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Date {}

impl PartialOrd for Date {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Date {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Add for Date {
    type Output = Date;

    fn add(self, rhs: Date) -> Date {
        Date::ymd(self.year + rhs.year, self.month + rhs.month, self.day + rhs.day)
    }
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let raw = raw.strip_prefix('\'').unwrap_or(raw).trim();
        if raw.is_empty() {
            return Ok(Date::default());
        }

        let invalid = || Error::InvalidDate {
            value: s.to_string(),
        };
        let parts: Vec<&str> = raw.trim_end_matches('.').split('.').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }
        let mut nums = [0i32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part.trim().parse::<i32>().map_err(|_| invalid())?;
        }

        Ok(Date {
            year: nums[0],
            month: nums[1],
            day: nums[2],
            month_set: parts.len() >= 2,
            day_set: parts.len() == 3,
        })
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month_set, self.day_set) {
            (false, false) => write!(f, "{}", self.year),
            (true, false) => write!(f, "{}.{}", self.year, self.month),
            _ => write!(f, "{}.{}.{}", self.year, self.month, self.day),
        }
    }
}

impl From<Date> for String {
    fn from(value: Date) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Date {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
