//! Date ranges for the recordings query

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use clap::ValueEnum;

use crate::error::ConfigError;

/// Format the recordings endpoint expects for `from` / `to`
const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const LAST_SECOND_OF_DAY: i64 = 24 * 60 * 60 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// Whole days from `first` 00:00:00 through `last` 23:59:59
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self::new(start_of(first), end_of(last))
    }

    pub fn is_ordered(&self) -> bool {
        self.from <= self.to
    }

    pub fn from_param(&self) -> String {
        self.from.format(QUERY_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format(QUERY_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from_param(), self.to_param())
    }
}

/// Named ranges relative to the current date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Timeframe {
    Today,
    Yesterday,
    LastSevenDays,
    /// Previous Monday to Sunday
    #[default]
    LastWeek,
    /// Previous calendar month
    LastMonth,
}

impl Timeframe {
    pub fn range(self, today: NaiveDate) -> DateRange {
        match self {
            Timeframe::Today => DateRange::days(today, today),
            Timeframe::Yesterday => {
                let yesterday = today - Days::new(1);
                DateRange::days(yesterday, yesterday)
            }
            Timeframe::LastSevenDays => DateRange::days(today - Days::new(7), today),
            Timeframe::LastWeek => {
                let since_monday = u64::from(today.weekday().num_days_from_monday());
                let monday = today - Days::new(since_monday + 7);
                let sunday = today - Days::new(since_monday + 1);
                DateRange::days(monday, sunday)
            }
            Timeframe::LastMonth => {
                let first_of_this_month = today - Days::new(u64::from(today.day0()));
                let last = first_of_this_month - Days::new(1);
                let first = last - Days::new(u64::from(last.day0()));
                DateRange::days(first, last)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Bound {
    Start,
    End,
}

/// Parse `YYYY-MM-DDTHH:MM:SS`, or a bare `YYYY-MM-DD` widened to the start or end of that day
pub fn parse_bound(key: &'static str, value: &str, bound: Bound) -> Result<NaiveDateTime, ConfigError> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, QUERY_FORMAT) {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(match bound {
            Bound::Start => start_of(date),
            Bound::End => end_of(date),
        });
    }
    Err(ConfigError::InvalidDate {
        key,
        value: value.to_string(),
    })
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of(date: NaiveDate) -> NaiveDateTime {
    start_of(date) + TimeDelta::seconds(LAST_SECOND_OF_DAY)
}
