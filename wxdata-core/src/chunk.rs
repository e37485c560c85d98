//! Month-aligned partitioning of a date range.
//!
//! The hourly point endpoint rejects long query windows, so hourly requests
//! are split at calendar-month boundaries. The first chunk starts at the
//! requested start date, every later chunk starts on the 1st, and the last
//! chunk ends exactly at the requested end date.

use chrono::{Datelike, NaiveDate};

use crate::model::DateRange;

/// Iterator over the month chunks of a [`DateRange`], in ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthChunks {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for MonthChunks {
    type Item = DateRange;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        if start > self.end {
            self.next = None;
            return None;
        }

        match first_of_next_month(start) {
            Some(boundary) if boundary <= self.end => {
                self.next = Some(boundary);
                Some(DateRange::new(start, boundary.pred_opt()?))
            }
            _ => {
                self.next = None;
                Some(DateRange::new(start, self.end))
            }
        }
    }
}

pub fn month_chunks(range: DateRange) -> MonthChunks {
    MonthChunks { next: Some(range.start), end: range.end }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        m => (date.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}
