//! The composite text stored in `citas.cita`.
//!
//! The legacy table has one free-text column, so a plan is written there as
//!
//! ```text
//! 🌍 {destination} | {start} to {end} | {plan}
//! ```
//!
//! and a cancelled plan carries a `[CANCELADO] ` prefix. Rows written by the
//! first version of the application use ` a ` instead of ` to ` between the
//! dates; both are accepted when parsing.

use std::fmt;

use thiserror::Error;

/// Prefix marking a cancelled legacy plan.
pub const CANCELLED_MARKER: &str = "[CANCELADO] ";

const LEAD: &str = "🌍 ";
const FIELD_SEPARATOR: &str = " | ";
const RANGE_SEPARATOR: &str = " to ";
const OLD_RANGE_SEPARATOR: &str = " a ";

/// Errors from [`PlanSummary::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryParseError {
    #[error("plan text does not start with the globe marker")]
    MissingLead,

    #[error("plan text has {0} of the 3 expected fields")]
    MissingFields(usize),

    #[error("date range {0:?} has no separator")]
    MalformedRange(String),
}

/// The fields a legacy plan row packs into its text column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub destination: String,
    pub travel_start_date: String,
    pub travel_end_date: String,
    pub plan: String,
    pub cancelled: bool,
}

impl PlanSummary {
    /// Parse composite text back into its fields.
    ///
    /// The destination must not itself contain `" | "`; the notes may.
    pub fn parse(text: &str) -> Result<Self, SummaryParseError> {
        let (cancelled, body) = match text.strip_prefix(CANCELLED_MARKER) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let body = body.strip_prefix(LEAD).ok_or(SummaryParseError::MissingLead)?;

        let fields: Vec<&str> = body.splitn(3, FIELD_SEPARATOR).collect();
        let &[destination, range, plan] = fields.as_slice() else {
            return Err(SummaryParseError::MissingFields(fields.len()));
        };

        let (start, end) = range
            .split_once(RANGE_SEPARATOR)
            .or_else(|| range.split_once(OLD_RANGE_SEPARATOR))
            .ok_or_else(|| SummaryParseError::MalformedRange(range.to_owned()))?;

        Ok(Self {
            destination: destination.to_owned(),
            travel_start_date: start.to_owned(),
            travel_end_date: end.to_owned(),
            plan: plan.to_owned(),
            cancelled,
        })
    }
}

/// Encode plan fields into composite text (never with the cancel marker;
/// cancelling is a separate, storage-side prefix).
pub fn encode_summary(destination: &str, start: &str, end: &str, plan: &str) -> String {
    format!("{LEAD}{destination}{FIELD_SEPARATOR}{start}{RANGE_SEPARATOR}{end}{FIELD_SEPARATOR}{plan}")
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            f.write_str(CANCELLED_MARKER)?;
        }
        f.write_str(&encode_summary(
            &self.destination,
            &self.travel_start_date,
            &self.travel_end_date,
            &self.plan,
        ))
    }
}

/// Whether legacy plan text carries the cancellation marker.
pub fn is_cancelled_text(text: &str) -> bool {
    text.starts_with(CANCELLED_MARKER)
}
