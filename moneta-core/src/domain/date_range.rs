//! Inclusive calendar date range used by list and summary queries

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Date format used on the wire and on the command line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive range of calendar dates, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::validation(format!(
                "Start date {} is after end date {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// The whole calendar month containing `year`/`month`
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::validation(format!("Invalid month: {}-{:02}", year, month)))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| Error::validation(format!("Invalid month: {}-{:02}", year, month)))?;
        Self::new(start, end)
    }

    /// Parse a month in `YYYY-MM` form
    pub fn parse_month(input: &str) -> Result<Self> {
        let (year, month) = input
            .trim()
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
            .ok_or_else(|| Error::validation(format!("Invalid month '{}'. Use YYYY-MM", input)))?;
        Self::month(year, month)
    }

    /// The calendar month containing today's local date
    pub fn current_month() -> Self {
        let today = Local::now().date_naive();
        Self::containing_month(today)
    }

    /// The calendar month containing `date`
    pub fn containing_month(date: NaiveDate) -> Self {
        // first/last day of an existing month always exist
        let start = date.with_day(1).unwrap_or(date);
        let end = Self::month(date.year(), date.month())
            .map(|r| r.end)
            .unwrap_or(date);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` lies within the range, both bounds included
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Query parameters for the range, in wire format
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format(DATE_FORMAT).to_string()),
            ("end", self.end.format(DATE_FORMAT).to_string()),
        ]
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| Error::validation(format!("Invalid date '{}'. Use YYYY-MM-DD", input)))
}
