//! Validation of submitted plan forms.
//!
//! Every rule runs on every submission. The caller gets the full list of
//! problems to show, not just the first one.

use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use super::dates::{DATE_FORMAT, parse_date};
use super::record::today;

/// Longest accepted `plan` text, in characters.
pub const MAX_PLAN_CHARS: usize = 50;

/// Session length assumed when the form leaves it blank.
pub const DEFAULT_DURATION_HOURS: i32 = 2;

/// Raw plan form fields, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanForm {
    pub destination: Option<String>,
    pub plan: Option<String>,
    pub duracion_horas: Option<String>,
    pub travel_start_date: Option<String>,
}

/// One rule violation. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanFormError {
    #[error("Debes seleccionar un tema")]
    MissingDestination,

    #[error("Las notas son obligatorias")]
    MissingPlan,

    #[error("Las notas no pueden tener más de 50 caracteres")]
    PlanTooLong { chars: usize },

    #[error("La duración debe ser un número positivo")]
    NonPositiveDuration(String),

    #[error("La duración no puede superar {max} horas", max = i32::MAX)]
    DurationTooLong(String),

    #[error("La duración debe ser un número válido")]
    InvalidDuration(String),

    #[error("No puedes seleccionar una fecha en el pasado")]
    StartInPast(NaiveDate),

    #[error("Formato de fecha inválido (AAAA-MM-DD)")]
    InvalidDate(String),
}

/// Outcome of validating a [`PlanForm`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<PlanFormError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[PlanFormError] {
        &self.errors
    }

    /// User-facing messages, in rule order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("formulario válido");
        }
        f.write_str("formulario de asesoría inválido: ")?;
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationReport {}

/// Fields of a validated form, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub destination: String,
    pub travel_start_date: NaiveDate,
    pub travel_end_date: NaiveDate,
    pub plan: String,
    pub duracion_horas: i32,
}

impl PlanDraft {
    pub fn start_text(&self) -> String {
        self.travel_start_date.format(DATE_FORMAT).to_string()
    }

    pub fn end_text(&self) -> String {
        self.travel_end_date.format(DATE_FORMAT).to_string()
    }
}

/// Validate a form against the local calendar date.
pub fn validate(form: &PlanForm) -> ValidationReport {
    validate_on(form, today())
}

/// Validate a form as of `today`.
pub fn validate_on(form: &PlanForm, today: NaiveDate) -> ValidationReport {
    let mut errors = Vec::new();

    if form.destination.as_deref().is_none_or(str::is_empty) {
        errors.push(PlanFormError::MissingDestination);
    }

    match form.plan.as_deref() {
        None | Some("") => errors.push(PlanFormError::MissingPlan),
        Some(plan) => {
            let chars = plan.chars().count();
            if chars > MAX_PLAN_CHARS {
                errors.push(PlanFormError::PlanTooLong { chars });
            }
        }
    }

    if let Some(raw) = form.duracion_horas.as_deref().filter(|s| !s.is_empty()) {
        if let Err(e) = parse_duration(raw) {
            errors.push(e);
        }
    }

    let raw_date = form.travel_start_date.as_deref().unwrap_or_default();
    match parse_date(raw_date) {
        Some(start) if start < today => errors.push(PlanFormError::StartInPast(start)),
        Some(_) => {}
        None => errors.push(PlanFormError::InvalidDate(raw_date.to_owned())),
    }

    ValidationReport { errors }
}

/// Parse a duration in whole hours. Any integer is classified, however
/// large, so only non-numeric text is reported as invalid.
fn parse_duration(raw: &str) -> Result<i32, PlanFormError> {
    let text = raw.trim();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PlanFormError::InvalidDuration(raw.to_owned()));
    }
    if text.starts_with('-') || digits.bytes().all(|b| b == b'0') {
        return Err(PlanFormError::NonPositiveDuration(text.to_owned()));
    }
    text.parse::<i32>().map_err(|_| PlanFormError::DurationTooLong(text.to_owned()))
}

impl PlanForm {
    /// Validate as of `today` and, when valid, build the draft to store.
    ///
    /// A session starts and ends on the same day. A blank duration becomes
    /// [`DEFAULT_DURATION_HOURS`].
    pub fn into_draft(self, today: NaiveDate) -> Result<PlanDraft, ValidationReport> {
        let report = validate_on(&self, today);
        if !report.is_valid() {
            return Err(report);
        }

        let start = self
            .travel_start_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(today);
        let duracion_horas = self
            .duracion_horas
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| parse_duration(s).ok())
            .unwrap_or(DEFAULT_DURATION_HOURS);

        Ok(PlanDraft {
            destination: self.destination.unwrap_or_default(),
            travel_start_date: start,
            travel_end_date: start,
            plan: self.plan.unwrap_or_default(),
            duracion_horas,
        })
    }
}
