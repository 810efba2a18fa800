//! Calendar helpers: ISO date parsing, year-month tokens and half-open date ranges.

use std::{fmt::Display, str::FromStr};

use serde::{Serialize, Serializer};
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [Error::InvalidArgument] if `text` is not a valid calendar date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), DATE_FORMAT)
        .map_err(|error| Error::InvalidArgument(format!("\"{text}\" is not a valid date: {error}")))
}

/// Parse an optional `YYYY-MM-DD` date, treating an empty string as unset.
pub fn parse_optional_date(text: Option<&str>) -> Result<Option<Date>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text).map(Some),
    }
}

/// A calendar month in a specific year, e.g. "2024-02".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first_day: Date,
}

impl YearMonth {
    /// Create a year-month from its parts.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if `month` is not in `1..=12` or the
    /// year is out of the supported range.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let month = Month::try_from(month)
            .map_err(|_| Error::InvalidArgument(format!("{month} is not a valid month")))?;
        let first_day = Date::from_calendar_date(year, month, 1)
            .map_err(|error| Error::InvalidArgument(format!("invalid year {year}: {error}")))?;

        Ok(Self { first_day })
    }

    /// The month containing `date`.
    pub fn of(date: Date) -> Self {
        Self {
            first_day: date.replace_day(1).unwrap_or(date),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.first_day.month()
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The number of days in the month, accounting for leap years.
    pub fn days_in_month(&self) -> u8 {
        time::util::days_in_year_month(self.year(), self.month())
    }

    /// The following month. December rolls over to January of the next year.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the next month is past the largest supported date.
    pub fn next(&self) -> Result<Self, Error> {
        let year = match self.month() {
            Month::December => self.year() + 1,
            _ => self.year(),
        };

        Self::new(year, self.month().next() as u8)
    }

    /// The month `count` months before this one.
    pub fn months_before(&self, count: u32) -> Result<Self, Error> {
        let index = self.year() as i64 * 12 + (self.month() as i64 - 1) - count as i64;
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) + 1;
        let year = i32::try_from(year)
            .map_err(|_| Error::InvalidArgument(format!("year {year} is out of range")))?;

        Self::new(year, month as u8)
    }

    /// The half-open range `[first day, first day of next month)`.
    pub fn date_range(&self) -> Result<DateRange, Error> {
        Ok(DateRange {
            start: self.first_day,
            end: self.next()?.first_day,
        })
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parse a strict `YYYY-MM` token.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidArgument(format!("\"{token}\" is not a valid YYYY-MM month"));

        let (year, month) = token.split_once('-').ok_or_else(invalid)?;
        let is_digits = |text: &str| text.bytes().all(|byte| byte.is_ascii_digit());

        if year.len() != 4 || month.len() != 2 || !is_digits(year) || !is_digits(month) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month).map_err(|_| invalid())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month() as u8)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day in the range.
    pub start: Date,
    /// The first day after the range.
    pub end: Date,
}

impl DateRange {
    /// A range of `days` days beginning on `start`.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the end date overflows.
    pub fn starting_at(start: Date, days: u16) -> Result<Self, Error> {
        let end = start
            .checked_add(time::Duration::days(days.into()))
            .ok_or_else(|| Error::InvalidArgument(format!("{start} plus {days} days overflows")))?;

        Ok(Self { start, end })
    }

    /// Whether `date` falls within the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }
}
