//! Database query functions for the `usuarios` table.
//!
//! Only what plan display needs: names for authors and participants.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::Usuario;

/// Insert a user. Returns the inserted row.
pub async fn insert_usuario(
    pool: &PgPool,
    nombre: &str,
    apellido: &str,
    email: &str,
) -> Result<Usuario> {
    let usuario = sqlx::query_as::<_, Usuario>(
        "INSERT INTO usuarios (nombre, apellido, email) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(nombre)
    .bind(apellido)
    .bind(email)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert usuario {email:?}"))?;

    Ok(usuario)
}

/// Fetch a user by id.
pub async fn get_usuario(pool: &PgPool, id: i64) -> Result<Option<Usuario>> {
    let usuario = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch usuario")?;

    Ok(usuario)
}

/// List every user except `excluded_id`, ordered by name.
pub async fn list_usuarios_except(pool: &PgPool, excluded_id: i64) -> Result<Vec<Usuario>> {
    let usuarios = sqlx::query_as::<_, Usuario>(
        "SELECT * FROM usuarios WHERE id <> $1 ORDER BY nombre, apellido, id",
    )
    .bind(excluded_id)
    .fetch_all(pool)
    .await
    .context("failed to list usuarios")?;

    Ok(usuarios)
}

/// List every user, ordered by name.
pub async fn list_usuarios(pool: &PgPool) -> Result<Vec<Usuario>> {
    let usuarios =
        sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios ORDER BY nombre, apellido, id")
            .fetch_all(pool)
            .await
            .context("failed to list usuarios")?;

    Ok(usuarios)
}
