//! Inclusive date range for querying occurrences.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{CalGridError, CalGridResult};
use crate::event::end_of_day;

/// Days shown when no end is given.
pub const DEFAULT_RANGE_DAYS: u64 = 30;

/// Inclusive range `[start, end]` in floating local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> CalGridResult<Self> {
        if end < start {
            return Err(CalGridError::Parse(format!(
                "Range end {} is before its start {}",
                end, start
            )));
        }
        Ok(DateRange { start, end })
    }

    /// From the start of `first` to the end of `last`.
    pub fn for_days(first: NaiveDate, last: NaiveDate) -> Self {
        DateRange {
            start: first.and_time(NaiveTime::MIN),
            end: end_of_day(last),
        }
    }

    /// Parse YYYY-MM-DD bounds, defaulting to `today` through
    /// `today + DEFAULT_RANGE_DAYS`.
    pub fn from_args(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> CalGridResult<Self> {
        let first = match from {
            Some(s) => parse_date(s)?,
            None => today,
        };
        let last = match to {
            Some(s) => parse_date(s)?,
            None => first + Days::new(DEFAULT_RANGE_DAYS),
        };

        let range = DateRange::for_days(first, last);
        DateRange::new(range.start, range.end)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Parse YYYY-MM-DD
pub fn parse_date(s: &str) -> CalGridResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CalGridError::Parse(format!("Invalid date format '{}'. Expected YYYY-MM-DD", s)))
}
