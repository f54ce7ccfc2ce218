//! Buckets transactions into a per-day or per-month series of expenses and revenues.

use serde::Serialize;
use time::Month;

use crate::{
    Amount, TransactionType,
    analytics::period::{Period, PeriodSelector},
    transaction::Transaction,
};

/// The number of day buckets in a daily timeline, whatever the month's length.
const DAYS_IN_DAILY_TIMELINE: usize = 31;

const MONTHS_IN_YEAR: usize = 12;

/// How a timeline splits up time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMode {
    /// One bucket per day of `month` in `year`, labelled "1" to "31".
    Daily {
        /// The calendar year.
        year: i32,
        /// The month within `year`.
        month: Month,
    },
    /// One bucket per month of `year`, labelled "Jan" to "Dec".
    Monthly {
        /// The calendar year.
        year: i32,
    },
}

impl TimelineMode {
    /// Daily for a monthly period with a month, monthly otherwise.
    pub fn for_selector(selector: &PeriodSelector) -> Self {
        match (selector.period, selector.month) {
            (Period::Monthly, Some(month)) => TimelineMode::Daily {
                year: selector.year,
                month,
            },
            _ => TimelineMode::Monthly {
                year: selector.year,
            },
        }
    }

    fn bucket_count(&self) -> usize {
        match self {
            TimelineMode::Daily { .. } => DAYS_IN_DAILY_TIMELINE,
            TimelineMode::Monthly { .. } => MONTHS_IN_YEAR,
        }
    }

    /// The bucket `transaction` falls into, or `None` if it is outside the timeline.
    fn bucket_index(&self, transaction: &Transaction) -> Option<usize> {
        let date = transaction.date;

        match *self {
            TimelineMode::Daily { year, month } if date.year() == year && date.month() == month => {
                Some(usize::from(date.day()) - 1)
            }
            TimelineMode::Monthly { year } if date.year() == year => {
                Some(usize::from(u8::from(date.month())) - 1)
            }
            _ => None,
        }
    }

    fn label(&self, index: usize) -> String {
        match self {
            TimelineMode::Daily { .. } => (index + 1).to_string(),
            TimelineMode::Monthly { .. } => {
                month_label(Month::January.nth_next(index as u8)).to_owned()
            }
        }
    }
}

/// Formats a month as a three-letter abbreviation, e.g. "Jan".
fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// The sums for one point of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBucket {
    /// The day of the month or abbreviated month name.
    pub period: String,
    /// The sum of expenses in the bucket.
    pub expenses: Amount,
    /// The sum of revenues in the bucket.
    pub revenues: Amount,
}

/// Sums expenses and revenues of `transactions` into the buckets of `mode`.
///
/// Always returns every bucket of the mode in chronological order, including
/// empty ones. Transactions outside the mode's month or year are ignored.
pub fn bucket_timeline<'a, I>(transactions: I, mode: TimelineMode) -> Vec<TimelineBucket>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut buckets = vec![(Amount::ZERO, Amount::ZERO); mode.bucket_count()];

    for transaction in transactions {
        let Some((expenses, revenues)) = mode
            .bucket_index(transaction)
            .and_then(|index| buckets.get_mut(index))
        else {
            continue;
        };

        match transaction.kind {
            TransactionType::Expense => *expenses += transaction.amount,
            TransactionType::Revenue => *revenues += transaction.amount,
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, (expenses, revenues))| TimelineBucket {
            period: mode.label(index),
            expenses,
            revenues,
        })
        .collect()
}
