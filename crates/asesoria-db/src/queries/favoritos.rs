//! Database query functions for the `favoritos` table (plan participation).

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::JoinedUser;

/// Record that a user joined a plan.
///
/// Returns `false` when the pair was already present; the unique constraint
/// on `(usuario_id, cita_id)` makes a repeated join a no-op.
pub async fn insert_favorito(pool: &PgPool, usuario_id: i64, cita_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO favoritos (usuario_id, cita_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(usuario_id)
    .bind(cita_id)
    .execute(pool)
    .await
    .context("failed to insert favorito")?;

    Ok(result.rows_affected() == 1)
}

/// Remove a user's participation in a plan. Returns rows affected.
pub async fn delete_favorito(pool: &PgPool, usuario_id: i64, cita_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM favoritos WHERE usuario_id = $1 AND cita_id = $2")
        .bind(usuario_id)
        .bind(cita_id)
        .execute(pool)
        .await
        .context("failed to delete favorito")?;

    Ok(result.rows_affected())
}

/// List the users who joined a plan, excluding its author, oldest join first.
pub async fn list_joined_users(pool: &PgPool, cita_id: i64) -> Result<Vec<JoinedUser>> {
    let users = sqlx::query_as::<_, JoinedUser>(
        "SELECT u.id AS usuario_id, u.nombre, u.apellido, f.creado_en AS fecha_union \
         FROM favoritos f \
         JOIN usuarios u ON f.usuario_id = u.id \
         JOIN citas c ON f.cita_id = c.id \
         WHERE f.cita_id = $1 AND u.id <> c.autor_id \
         ORDER BY f.creado_en ASC, f.id ASC",
    )
    .bind(cita_id)
    .fetch_all(pool)
    .await
    .context("failed to list joined users")?;

    Ok(users)
}

/// Count every participation row for a plan, the author's included.
pub async fn count_favoritos(pool: &PgPool, cita_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favoritos WHERE cita_id = $1")
        .bind(cita_id)
        .fetch_one(pool)
        .await
        .context("failed to count favoritos")?;

    Ok(count)
}
