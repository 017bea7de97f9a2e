//! Date ranges: validity windows and service periods.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month, used as the unit of distinct-month coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DatePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `other` lies entirely inside this period, bounds included.
    pub fn contains_period(&self, other: &DatePeriod) -> bool {
        self.start <= other.start && other.start <= other.end && other.end <= self.end
    }

    /// Calendar months between start and end.
    ///
    /// 15.12.2024 - 14.01.2025 is 1 month, 15.09.2024 - 14.09.2025 is 12.
    pub fn months_spanned(&self) -> i32 {
        (self.end.year() - self.start.year()) * 12 + self.end.month() as i32
            - self.start.month() as i32
    }

    /// The month this period is billed for (the month it starts in).
    pub fn month_key(&self) -> MonthKey {
        MonthKey::of(self.start)
    }
}

impl fmt::Display for DatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%d.%m.%Y"),
            self.end.format("%d.%m.%Y")
        )
    }
}
