//! Shared test utilities for asesoria integration tests.
//!
//! Every test gets a throwaway database, migrated to the current schema,
//! inside one PostgreSQL server shared by the whole test binary:
//!
//! - with **`ASESORIA_TEST_PG_URL`** set (e.g. a server started by a nextest
//!   setup script or CI service) that server is used as-is;
//! - otherwise a container is started through testcontainers on first use
//!   and kept alive in a `OnceCell` for the rest of the binary.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use asesoria_db::models::Usuario;
use asesoria_db::pool;
use asesoria_db::queries::usuarios;

struct Server {
    /// Server root, no database name appended.
    base_url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(url) = std::env::var("ASESORIA_TEST_PG_URL") {
        return Server {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("16-alpine")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    Server {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

async fn base_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.base_url
}

async fn maintenance_pool() -> PgPool {
    let url = format!("{}/postgres", base_url().await);
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("failed to connect to maintenance database")
}

/// Create a uniquely named database with all migrations applied.
///
/// Returns `(pool, db_name)`; hand `db_name` to [`drop_test_db`] once the
/// pool is closed.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("asesoria_test_{}", Uuid::new_v4().simple());

    let maint = maintenance_pool().await;
    maint
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create temp database {db_name}: {e}"));
    maint.close().await;

    let url = test_db_url(&db_name).await;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to temp database {db_name}: {e}"));

    pool::run_migrations(&pool)
        .await
        .expect("migrations should succeed");

    (pool, db_name)
}

/// Connection URL of a database created by [`create_test_db`], for code
/// under test that opens its own connections.
pub async fn test_db_url(db_name: &str) -> String {
    format!("{}/{db_name}", base_url().await)
}

/// Drop a database created by [`create_test_db`], disconnecting any
/// stragglers first. Errors are ignored so cleanup never masks a failure.
pub async fn drop_test_db(db_name: &str) {
    let maint = maintenance_pool().await;

    let _ = sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(db_name)
    .execute(&maint)
    .await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}

/// Insert a user with a unique email.
pub async fn create_test_user(pool: &PgPool, nombre: &str, apellido: &str) -> Usuario {
    let email = format!(
        "{}.{}@example.test",
        nombre.to_lowercase(),
        Uuid::new_v4().simple()
    );
    usuarios::insert_usuario(pool, nombre, apellido, &email)
        .await
        .expect("insert_usuario should succeed")
}
