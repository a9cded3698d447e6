//! Calendar month arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A `(year, month)` pair, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidArgument(format!("month {} out of range", month)));
        }
        // Rejects years chrono cannot represent
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidArgument(format!("year {} out of range", year)))?;
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Number of calendar days in this month (28-31).
    pub fn days_in_month(&self) -> usize {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
            Some(next) => (next - self.first_day()).num_days() as usize,
            None => 31,
        }
    }

    /// Weekday of the 1st, Monday = 0 through Sunday = 6.
    pub fn first_weekday(&self) -> u8 {
        self.first_day().weekday().num_days_from_monday() as u8
    }

    /// Checks that `day` is a valid day-of-month for this month.
    pub fn check_day(&self, day: u32) -> Result<()> {
        if day == 0 || day as usize > self.days_in_month() {
            return Err(Error::InvalidArgument(format!(
                "day {} is not in {} (1..={})",
                day,
                self,
                self.days_in_month()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::InvalidArgument(format!("malformed month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}
