//! Date normalization.
//!
//! Plan dates reach the record as form text, as `DATE` columns, or as
//! timestamps. Consumers only ever see canonical `YYYY-MM-DD` text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Canonical storage and wire format for plan dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DISPLAY_FORMAT: &str = "%b %d %Y";

/// A date-like value from any source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl<'a> From<&'a str> for DateValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for DateValue<'_> {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for DateValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl DateValue<'_> {
    /// The calendar date, if one can be recovered. Text is accepted as
    /// `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.
    pub fn to_date(self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(date),
            Self::Timestamp(ts) => Some(ts.date_naive()),
            Self::Text(text) => {
                let text = text.trim();
                NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                    .map(|dt| dt.date())
                    .or_else(|_| NaiveDate::parse_from_str(text, DATE_FORMAT))
                    .ok()
            }
        }
    }
}

/// Render any date-like value as `YYYY-MM-DD`.
///
/// Text that is not a recognizable date comes back unchanged.
pub fn normalize_date(value: DateValue<'_>) -> String {
    match value {
        DateValue::Text(text) => value
            .to_date()
            .map_or_else(|| text.to_owned(), canonical),
        DateValue::Date(date) => canonical(date),
        DateValue::Timestamp(ts) => canonical(ts.date_naive()),
    }
}

fn canonical(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse strict `YYYY-MM-DD` form input.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Human-facing form used in listings, e.g. `Jun 23 2024`.
///
/// Missing or empty values render as `N/A`; unparseable text is shown as-is.
pub fn format_travel_date(value: Option<DateValue<'_>>) -> String {
    let date = match value {
        None | Some(DateValue::Text("")) => return "N/A".to_owned(),
        Some(DateValue::Text(text)) => match parse_date(text) {
            Some(date) => date,
            None => return text.to_owned(),
        },
        Some(DateValue::Date(date)) => date,
        Some(DateValue::Timestamp(ts)) => ts.date_naive(),
    };
    date.format(DISPLAY_FORMAT).to_string()
}
