//! The unified plan record.
//!
//! Rows come from either `travel_plans` or `citas` and are mapped through
//! one adapter per schema into [`Plan`], so nothing downstream needs to know
//! which table answered.

use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use serde::Serialize;

use asesoria_db::models::{LegacyPlanRow, ModernPlanRow, PlanSource, SourceSchema};

use super::dates::{DateValue, normalize_date};
use super::summary::{PlanSummary, is_cancelled_text};

/// Description given to plans read from `citas`, which has no such column.
pub const LEGACY_DESCRIPTION: &str = "Plan migrado desde reflexión";

/// Notes given to a `citas` row whose text column is NULL.
pub const LEGACY_PLAN_FALLBACK: &str = "Plan de viaje";

/// Length of the date window synthesized for `citas` rows.
pub const LEGACY_SPAN_DAYS: u64 = 7;

/// A plan, independent of the table it was read from.
///
/// Dates are always `YYYY-MM-DD` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub id: i64,
    pub destination: String,
    pub description: String,
    pub travel_start_date: String,
    pub travel_end_date: String,
    pub plan: String,
    pub duracion_horas: Option<i32>,
    pub is_active: bool,
    pub autor_id: i64,
    pub creado_en: DateTime<Utc>,
    pub actualizado_en: DateTime<Utc>,
    pub autor_nombre: String,
    pub autor_apellido: String,
    pub source: SourceSchema,
}

impl Plan {
    /// Normalize a row. `today` anchors the dates synthesized for legacy rows.
    pub fn from_source(source: PlanSource, today: NaiveDate) -> Self {
        match source {
            PlanSource::Modern(row) => Self::from_modern(row),
            PlanSource::Legacy(row) => Self::from_legacy(row, today),
        }
    }

    fn from_modern(row: ModernPlanRow) -> Self {
        Self {
            id: row.id,
            destination: row.destination,
            description: row.description.unwrap_or_default(),
            travel_start_date: normalize_date(DateValue::Date(row.travel_start_date)),
            travel_end_date: normalize_date(DateValue::Date(row.travel_end_date)),
            plan: row.plan,
            duracion_horas: row.duracion_horas,
            is_active: row.is_active.unwrap_or(true),
            autor_id: row.autor_id,
            creado_en: row.creado_en,
            actualizado_en: row.actualizado_en,
            autor_nombre: row.autor_nombre,
            autor_apellido: row.autor_apellido,
            source: SourceSchema::Modern,
        }
    }

    fn from_legacy(row: LegacyPlanRow, today: NaiveDate) -> Self {
        let end = today
            .checked_add_days(Days::new(LEGACY_SPAN_DAYS))
            .unwrap_or(today);

        Self {
            id: row.id,
            destination: format!("Destino #{}", row.id),
            description: LEGACY_DESCRIPTION.to_owned(),
            travel_start_date: normalize_date(DateValue::Date(today)),
            travel_end_date: normalize_date(DateValue::Date(end)),
            plan: row.cita.unwrap_or_else(|| LEGACY_PLAN_FALLBACK.to_owned()),
            duracion_horas: None,
            is_active: true,
            autor_id: row.autor_id,
            creado_en: row.creado_en,
            actualizado_en: row.actualizado_en,
            autor_nombre: row.autor_nombre,
            autor_apellido: row.autor_apellido,
            source: SourceSchema::Legacy,
        }
    }

    /// "Nombre Apellido" of the author.
    pub fn author_name(&self) -> String {
        format!("{} {}", self.autor_nombre, self.autor_apellido)
    }

    pub fn is_authored_by(&self, usuario_id: i64) -> bool {
        self.autor_id == usuario_id
    }

    /// Whether the plan is cancelled: an inactive modern row, or legacy
    /// text carrying the cancellation marker. Agrees with
    /// `summary().cancelled` whenever a summary exists.
    pub fn is_cancelled(&self) -> bool {
        match self.source {
            SourceSchema::Modern => !self.is_active,
            SourceSchema::Legacy => is_cancelled_text(&self.plan),
        }
    }

    /// The fields as the author entered them.
    ///
    /// Modern rows have them as columns. Legacy rows carry them inside the
    /// composite text; `None` when that text predates the composite format.
    pub fn summary(&self) -> Option<PlanSummary> {
        match self.source {
            SourceSchema::Modern => Some(PlanSummary {
                destination: self.destination.clone(),
                travel_start_date: self.travel_start_date.clone(),
                travel_end_date: self.travel_end_date.clone(),
                plan: self.plan.clone(),
                cancelled: !self.is_active,
            }),
            SourceSchema::Legacy => PlanSummary::parse(&self.plan).ok(),
        }
    }
}

impl From<PlanSource> for Plan {
    fn from(source: PlanSource) -> Self {
        Self::from_source(source, today())
    }
}

/// The local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
