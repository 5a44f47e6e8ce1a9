use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Schema tags
// ---------------------------------------------------------------------------

/// Which physical table a plan row was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSchema {
    /// `travel_plans`: explicit columns for every plan field.
    Modern,
    /// `citas`: one free-text column holding the whole plan.
    Legacy,
}

impl SourceSchema {
    /// Name of the backing table.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Modern => "travel_plans",
            Self::Legacy => "citas",
        }
    }
}

impl fmt::Display for SourceSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A `travel_plans` row joined with its author's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModernPlanRow {
    pub id: i64,
    pub destination: String,
    pub description: Option<String>,
    pub travel_start_date: NaiveDate,
    pub travel_end_date: NaiveDate,
    pub plan: String,
    pub duracion_horas: Option<i32>,
    pub is_active: Option<bool>,
    pub autor_id: i64,
    pub creado_en: DateTime<Utc>,
    pub actualizado_en: DateTime<Utc>,
    pub autor_nombre: String,
    pub autor_apellido: String,
}

/// A `citas` row joined with its author's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LegacyPlanRow {
    pub id: i64,
    pub cita: Option<String>,
    pub autor_id: i64,
    pub creado_en: DateTime<Utc>,
    pub actualizado_en: DateTime<Utc>,
    pub autor_nombre: String,
    pub autor_apellido: String,
}

/// A `citas` row the viewer joined, tagged with the time of joining.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JoinedPlanRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub row: LegacyPlanRow,
    pub joined_at: DateTime<Utc>,
}

/// A plan row as read from storage, tagged with the schema it came from.
#[derive(Debug, Clone)]
pub enum PlanSource {
    Modern(ModernPlanRow),
    Legacy(LegacyPlanRow),
}

impl PlanSource {
    pub fn id(&self) -> i64 {
        match self {
            Self::Modern(row) => row.id,
            Self::Legacy(row) => row.id,
        }
    }

    pub fn schema(&self) -> SourceSchema {
        match self {
            Self::Modern(_) => SourceSchema::Modern,
            Self::Legacy(_) => SourceSchema::Legacy,
        }
    }
}

/// A participant of a plan, with the time they joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct JoinedUser {
    pub usuario_id: i64,
    pub nombre: String,
    pub apellido: String,
    pub fecha_union: DateTime<Utc>,
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: i64,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub creado_en: DateTime<Utc>,
    pub actualizado_en: DateTime<Utc>,
}

impl Usuario {
    /// "Nombre Apellido".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
