use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Schema for `usuarios`, `citas`, `favoritos` and `travel_plans`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Open the pool every `asesoria` command runs its queries on.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = connect(&config.database_url, 5).await?;
    debug!(db = config.database_name(), "connection pool ready");
    Ok(pool)
}

/// Bring the schema up to date. Already-applied versions are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(versions = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// Create the database named in `config` unless the server already has it.
///
/// `db-init` calls this before opening the regular pool, so it talks to the
/// server through the `postgres` database instead.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let Some(db_name) = config.database_name() else {
        bail!("no database name in {}", config.database_url);
    };
    if !is_safe_identifier(db_name) {
        bail!("database name {db_name:?} contains invalid characters");
    }

    let admin = connect(&config.maintenance_url(), 1).await?;
    let result = create_if_missing(&admin, db_name).await;
    admin.close().await;
    result
}

async fn create_if_missing(admin: &PgPool, db_name: &str) -> Result<()> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(admin)
            .await
            .context("failed to query pg_database")?;

    if exists {
        debug!(db = db_name, "database present");
        return Ok(());
    }

    // Identifiers cannot be bound; the name was checked by the caller.
    admin
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .with_context(|| format!("failed to create database {db_name}"))?;
    info!(db = db_name, "database created");
    Ok(())
}

/// Row counts for the application tables, sorted by table name.
///
/// `_sqlx_migrations` is left out.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%' \
         ORDER BY tablename",
    )
    .fetch_all(pool)
    .await
    .context("failed to list tables")?;

    let mut counts = Vec::with_capacity(tables.len());
    for table in tables {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}

fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
