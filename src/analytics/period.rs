//! Turns the `period`, `month` and `year` query parameters into a date filter.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::Error;

/// The earliest and latest years accepted in a query.
const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

/// The raw period query parameters.
///
/// Values are kept as strings so that malformed numbers are reported as
/// validation errors instead of generic query rejections.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PeriodQuery {
    /// `monthly`, `yearly`, or anything else for no restriction.
    pub period: Option<String>,
    /// The month number, 1 to 12.
    pub month: Option<String>,
    /// The calendar year, defaults to the current year.
    pub year: Option<String>,
}

/// The time scope of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// No restriction.
    None,
    /// A single month.
    Monthly,
    /// A single calendar year.
    Yearly,
}

/// A validated period query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSelector {
    /// The time scope.
    pub period: Period,
    /// The month, if one was given.
    pub month: Option<Month>,
    /// The year, which defaults to the current year.
    pub year: i32,
}

impl PeriodSelector {
    /// Validate `query`, filling in `current_year` when no year is given.
    ///
    /// An unrecognized `period` means no restriction. Empty `month` and `year`
    /// values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `month` is not an integer from 1 to 12 or
    /// `year` is not an integer from 1 to 9999.
    pub fn parse(query: &PeriodQuery, current_year: i32) -> Result<Self, Error> {
        let period = match query.period.as_deref() {
            Some("monthly") => Period::Monthly,
            Some("yearly") => Period::Yearly,
            _ => Period::None,
        };

        let month = non_empty(&query.month).map(parse_month).transpose()?;
        let year = non_empty(&query.year)
            .map(parse_year)
            .transpose()?
            .unwrap_or(current_year);

        Ok(Self {
            period,
            month,
            year,
        })
    }

    /// The filter that decides which transaction dates fall in this period.
    ///
    /// A monthly period without a month is not restricted at all, the same as
    /// no period.
    pub fn date_filter(&self) -> DateFilter {
        match (self.period, self.month) {
            (Period::Monthly, Some(month)) => DateFilter::Month {
                year: self.year,
                month,
            },
            (Period::Yearly, _) => DateFilter::Year(self.year),
            _ => DateFilter::All,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_month(raw: &str) -> Result<Month, Error> {
    raw.parse::<u8>()
        .ok()
        .and_then(|number| Month::try_from(number).ok())
        .ok_or_else(|| {
            Error::Validation(format!(
                "month must be an integer from 1 to 12, got \"{raw}\""
            ))
        })
}

fn parse_year(raw: &str) -> Result<i32, Error> {
    raw.parse::<i32>()
        .ok()
        .filter(|year| YEAR_RANGE.contains(year))
        .ok_or_else(|| {
            Error::Validation(format!(
                "year must be an integer from {} to {}, got \"{raw}\"",
                YEAR_RANGE.start(),
                YEAR_RANGE.end()
            ))
        })
}

/// A predicate over transaction dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Every date matches.
    All,
    /// Dates in `month` of `year`.
    Month {
        /// The calendar year.
        year: i32,
        /// The month within `year`.
        month: Month,
    },
    /// Dates in the calendar year.
    Year(i32),
}

impl DateFilter {
    /// Whether `date` passes the filter.
    pub fn contains(&self, date: Date) -> bool {
        match *self {
            DateFilter::All => true,
            DateFilter::Month { year, month } => date.year() == year && date.month() == month,
            DateFilter::Year(year) => date.year() == year,
        }
    }

    /// The inclusive range of dates that pass the filter, or `None` if every
    /// date passes or the range cannot be represented.
    pub fn date_range(&self) -> Option<RangeInclusive<Date>> {
        match *self {
            DateFilter::All => None,
            DateFilter::Month { year, month } => {
                let start = Date::from_calendar_date(year, month, 1).ok()?;
                let end = match month {
                    Month::December => Date::from_calendar_date(year, Month::December, 31).ok()?,
                    _ => Date::from_calendar_date(year, month.next(), 1)
                        .ok()?
                        .previous_day()?,
                };

                Some(start..=end)
            }
            DateFilter::Year(year) => {
                let start = Date::from_calendar_date(year, Month::January, 1).ok()?;
                let end = Date::from_calendar_date(year, Month::December, 31).ok()?;

                Some(start..=end)
            }
        }
    }
}
