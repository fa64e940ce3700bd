//! The reporting period: the calendar month before "today".

use chrono::{Datelike as _, Local, NaiveDate};

use crate::error::{ReportError, Result};

/// Date format for API query parameters.
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// The month a report covers, plus the start of its year for
/// year-to-date figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPeriod {
    /// First day of the month.
    start: NaiveDate,
    /// Last day of the month.
    end: NaiveDate,
    /// January 1st of the month's year.
    year_start: NaiveDate,
}

impl ReportingPeriod {
    /// The calendar month preceding `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidPeriod`] if `today` falls in the first
    /// month representable by [`NaiveDate`].
    #[inline]
    pub fn previous_month(today: NaiveDate) -> Result<Self> {
        let end = today
            .with_day(1)
            .and_then(|first| first.pred_opt())
            .ok_or(ReportError::InvalidPeriod(today))?;
        let start = end.with_day(1).ok_or(ReportError::InvalidPeriod(today))?;
        let year_start = start.with_month(1).ok_or(ReportError::InvalidPeriod(today))?;
        Ok(Self {
            start,
            end,
            year_start,
        })
    }

    /// The calendar month preceding the local date.
    ///
    /// # Errors
    ///
    /// See [`Self::previous_month`].
    #[inline]
    pub fn last_month() -> Result<Self> {
        Self::previous_month(Local::now().date_naive())
    }

    /// First day of the month.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the month.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// January 1st of the reported year.
    #[inline]
    #[must_use]
    pub const fn year_start(&self) -> NaiveDate {
        self.year_start
    }

    /// English month name, e.g. `"March"`.
    #[inline]
    #[must_use]
    pub fn month_name(&self) -> String {
        self.start.format("%B").to_string()
    }

    /// Reported year.
    #[inline]
    #[must_use]
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// `start`/`end` query parameters covering the month.
    #[must_use]
    pub fn month_query(&self) -> [(&'static str, String); 2] {
        [
            ("start", format_query_date(self.start)),
            ("end", format_query_date(self.end)),
        ]
    }

    /// `start`/`end` query parameters from January 1st to the month's end.
    #[must_use]
    pub fn year_to_date_query(&self) -> [(&'static str, String); 2] {
        [
            ("start", format_query_date(self.year_start)),
            ("end", format_query_date(self.end)),
        ]
    }
}

/// Formats a date as `YYYY-MM-DD`.
fn format_query_date(date: NaiveDate) -> String {
    date.format(QUERY_DATE_FORMAT).to_string()
}
