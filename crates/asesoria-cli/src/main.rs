mod config;
mod plan_cmds;
mod user_cmds;

use clap::{Args, Parser, Subcommand};

use asesoria_db::pool;

use config::AsesoriaConfig;

#[derive(Parser)]
#[command(name = "asesoria", about = "Solicitudes de asesoría: crear, consultar y unirse")]
struct Cli {
    /// URL de la base de datos (tiene prioridad sobre ASESORIA_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Imprimir los registros como JSON en lugar de tablas
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Escribir el archivo de configuración (no requiere base de datos)
    Init {
        /// URL de conexión a PostgreSQL
        #[arg(long, default_value = "postgresql://localhost:5432/asesoria")]
        db_url: String,
        /// Sobrescribir el archivo de configuración existente
        #[arg(long)]
        force: bool,
    },
    /// Crear la base de datos si hace falta y aplicar las migraciones
    DbInit,
    /// Gestión de usuarios
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Gestión de asesorías
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Registrar un usuario
    Add {
        nombre: String,
        apellido: String,
        email: String,
    },
    /// Listar usuarios
    List {
        /// Excluir este usuario del listado
        #[arg(long)]
        except: Option<i64>,
    },
}

/// Form fields shared by `plan create` and `plan update`.
///
/// All optional here so that the validator, not clap, reports what is missing.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanFields {
    /// Tema de la asesoría
    #[arg(long)]
    pub topic: Option<String>,
    /// Notas para el tutor (máximo 50 caracteres)
    #[arg(long)]
    pub notes: Option<String>,
    /// Fecha de la sesión, AAAA-MM-DD, hoy o posterior
    #[arg(long)]
    pub date: Option<String>,
    /// Duración en horas enteras (por defecto 2)
    #[arg(long)]
    pub hours: Option<String>,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Solicitar una asesoría
    Create {
        /// ID del usuario que actúa
        #[arg(long)]
        user: i64,
        #[command(flatten)]
        fields: PlanFields,
    },
    /// Mostrar una asesoría y sus participantes
    Show {
        plan_id: i64,
    },
    /// Listar las asesorías de un usuario
    Mine {
        #[arg(long)]
        user: i64,
    },
    /// Listar asesorías a las que un usuario puede unirse
    Feed {
        #[arg(long)]
        user: i64,
    },
    /// Listar las asesorías creadas o unidas por un usuario
    Schedule {
        #[arg(long)]
        user: i64,
    },
    /// Unirse a la asesoría de otro usuario
    Join {
        #[arg(long)]
        user: i64,
        plan_id: i64,
    },
    /// Abandonar una asesoría
    Leave {
        #[arg(long)]
        user: i64,
        plan_id: i64,
    },
    /// Reescribir una asesoría (solo el autor)
    Update {
        #[arg(long)]
        user: i64,
        plan_id: i64,
        #[command(flatten)]
        fields: PlanFields,
    },
    /// Cancelar una asesoría (solo el autor)
    Cancel {
        #[arg(long)]
        user: i64,
        plan_id: i64,
    },
    /// Eliminar una asesoría y sus participantes (solo el autor)
    Delete {
        #[arg(long)]
        user: i64,
        plan_id: i64,
    },
}

/// Execute the `asesoria init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "el archivo de configuración ya existe en {}\nUsa --force para sobrescribirlo.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
    };

    config::save_config(&cfg)?;

    println!("Configuración escrita en {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Siguiente paso: ejecuta `asesoria db-init` para crear y migrar la base de datos.");

    Ok(())
}

/// Execute the `asesoria db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = AsesoriaConfig::resolve(cli_db_url)?;

    println!("Inicializando la base de datos de asesoria...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = async {
        pool::run_migrations(&db_pool).await?;
        pool::table_counts(&db_pool).await
    }
    .await;
    db_pool.close().await;

    println!("Base de datos lista. Tablas:");
    for (table, count) in &result? {
        println!("  {table}: {count} filas");
    }
    println!("asesoria db-init completado.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::User { command } => {
            let resolved = AsesoriaConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = user_cmds::run_user_command(command, &db_pool, cli.json).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = AsesoriaConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool, cli.json).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}
