//! Database query functions for the two plan tables: `travel_plans` (modern
//! shape) and `citas` (legacy shape).
//!
//! Every read joins `usuarios` so the author's display name travels with the
//! row.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{JoinedPlanRow, LegacyPlanRow, ModernPlanRow};

const MODERN_SELECT: &str = "SELECT tp.id, tp.destination, tp.description, \
     tp.travel_start_date, tp.travel_end_date, tp.plan, tp.duracion_horas, tp.is_active, \
     tp.autor_id, tp.creado_en, tp.actualizado_en, \
     u.nombre AS autor_nombre, u.apellido AS autor_apellido \
     FROM travel_plans tp \
     JOIN usuarios u ON tp.autor_id = u.id";

const LEGACY_SELECT: &str = "SELECT c.id, c.cita, c.autor_id, c.creado_en, c.actualizado_en, \
     u.nombre AS autor_nombre, u.apellido AS autor_apellido \
     FROM citas c \
     JOIN usuarios u ON c.autor_id = u.id";

// ---------------------------------------------------------------------------
// travel_plans
// ---------------------------------------------------------------------------

/// Column values for a new `travel_plans` row.
#[derive(Debug, Clone)]
pub struct NewModernPlan<'a> {
    pub destination: &'a str,
    pub description: Option<&'a str>,
    pub travel_start_date: NaiveDate,
    pub travel_end_date: NaiveDate,
    pub plan: &'a str,
    pub duracion_horas: Option<i32>,
    pub autor_id: i64,
}

/// Insert a `travel_plans` row. Returns the new id.
pub async fn insert_modern_plan(pool: &PgPool, new: &NewModernPlan<'_>) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO travel_plans \
         (destination, description, travel_start_date, travel_end_date, plan, duracion_horas, autor_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(new.destination)
    .bind(new.description)
    .bind(new.travel_start_date)
    .bind(new.travel_end_date)
    .bind(new.plan)
    .bind(new.duracion_horas)
    .bind(new.autor_id)
    .fetch_one(pool)
    .await
    .context("failed to insert travel plan")?;

    Ok(id)
}

/// Fetch a `travel_plans` row by id.
pub async fn get_modern_plan(pool: &PgPool, id: i64) -> Result<Option<ModernPlanRow>> {
    let query = format!("{MODERN_SELECT} WHERE tp.id = $1");
    let row = sqlx::query_as::<_, ModernPlanRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch travel plan")?;

    Ok(row)
}

/// List an author's `travel_plans` rows, newest first.
pub async fn list_modern_plans_by_author(
    pool: &PgPool,
    autor_id: i64,
) -> Result<Vec<ModernPlanRow>> {
    let query = format!("{MODERN_SELECT} WHERE tp.autor_id = $1 ORDER BY tp.creado_en DESC, tp.id DESC");
    let rows = sqlx::query_as::<_, ModernPlanRow>(&query)
        .bind(autor_id)
        .fetch_all(pool)
        .await
        .context("failed to list travel plans for author")?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// citas
// ---------------------------------------------------------------------------

/// Insert a `citas` row holding the composite plan text. Returns the new id.
pub async fn insert_legacy_plan(pool: &PgPool, cita: &str, autor_id: i64) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO citas (cita, autor_id) \
         VALUES ($1, $2) \
         RETURNING id",
    )
    .bind(cita)
    .bind(autor_id)
    .fetch_one(pool)
    .await
    .context("failed to insert cita")?;

    Ok(id)
}

/// Fetch a `citas` row by id.
pub async fn get_legacy_plan(pool: &PgPool, id: i64) -> Result<Option<LegacyPlanRow>> {
    let query = format!("{LEGACY_SELECT} WHERE c.id = $1");
    let row = sqlx::query_as::<_, LegacyPlanRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch cita")?;

    Ok(row)
}

/// List an author's `citas` rows, newest first.
pub async fn list_legacy_plans_by_author(
    pool: &PgPool,
    autor_id: i64,
) -> Result<Vec<LegacyPlanRow>> {
    let query = format!("{LEGACY_SELECT} WHERE c.autor_id = $1 ORDER BY c.creado_en DESC, c.id DESC");
    let rows = sqlx::query_as::<_, LegacyPlanRow>(&query)
        .bind(autor_id)
        .fetch_all(pool)
        .await
        .context("failed to list citas for author")?;

    Ok(rows)
}

/// List up to `limit` `citas` rows the viewer neither wrote nor joined,
/// newest first.
pub async fn list_legacy_plans_for_viewer(
    pool: &PgPool,
    viewer_id: i64,
    limit: i64,
) -> Result<Vec<LegacyPlanRow>> {
    let query = format!(
        "{LEGACY_SELECT} \
         WHERE c.autor_id <> $1 \
           AND NOT EXISTS ( \
               SELECT 1 FROM favoritos f WHERE f.cita_id = c.id AND f.usuario_id = $1 \
           ) \
         ORDER BY c.creado_en DESC, c.id DESC \
         LIMIT $2"
    );
    let rows = sqlx::query_as::<_, LegacyPlanRow>(&query)
        .bind(viewer_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("failed to list citas for viewer")?;

    Ok(rows)
}

/// List the `citas` rows a user joined (excluding their own), each with the
/// time the user joined it. Ordered by plan creation time, newest first.
pub async fn list_legacy_plans_joined_by(
    pool: &PgPool,
    usuario_id: i64,
) -> Result<Vec<JoinedPlanRow>> {
    let rows = sqlx::query_as::<_, JoinedPlanRow>(
        "SELECT c.id, c.cita, c.autor_id, c.creado_en, c.actualizado_en, \
         u.nombre AS autor_nombre, u.apellido AS autor_apellido, \
         f.creado_en AS joined_at \
         FROM citas c \
         JOIN favoritos f ON c.id = f.cita_id \
         JOIN usuarios u ON c.autor_id = u.id \
         WHERE f.usuario_id = $1 AND c.autor_id <> $1 \
         ORDER BY c.creado_en DESC, c.id DESC",
    )
    .bind(usuario_id)
    .fetch_all(pool)
    .await
    .context("failed to list joined citas")?;

    Ok(rows)
}

/// Overwrite the composite text of a `citas` row. Returns rows affected.
pub async fn update_legacy_plan_text(pool: &PgPool, id: i64, cita: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE citas SET cita = $2, actualizado_en = now() WHERE id = $1",
    )
    .bind(id)
    .bind(cita)
    .execute(pool)
    .await
    .context("failed to update cita")?;

    Ok(result.rows_affected())
}

/// Prefix the text of a `citas` row with `marker`, unless it already starts
/// with it. Returns rows affected (0 when already marked or missing).
pub async fn prefix_legacy_plan_text(pool: &PgPool, id: i64, marker: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE citas \
         SET cita = $2 || COALESCE(cita, ''), actualizado_en = now() \
         WHERE id = $1 AND NOT starts_with(COALESCE(cita, ''), $2)",
    )
    .bind(id)
    .bind(marker)
    .execute(pool)
    .await
    .context("failed to mark cita")?;

    Ok(result.rows_affected())
}

/// Delete a `citas` row. Participation rows go with it (`ON DELETE CASCADE`).
/// Returns rows affected.
pub async fn delete_legacy_plan(pool: &PgPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM citas WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete cita")?;

    Ok(result.rows_affected())
}
