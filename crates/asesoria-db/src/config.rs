use std::env;

/// Database configuration.
///
/// Reads from the `ASESORIA_DATABASE_URL` environment variable, falling back
/// to `postgresql://localhost:5432/asesoria` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/asesoria";

    /// Build a config from the environment.
    ///
    /// Priority: `ASESORIA_DATABASE_URL` env var, then the compile-time default.
    pub fn from_env() -> Self {
        let database_url = env::var("ASESORIA_DATABASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (CLI flags, config file, tests).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The logical database name: the last path segment of the URL, with any
    /// query string removed.
    ///
    /// Returns `None` if the URL has no usable path component.
    pub fn database_name(&self) -> Option<&str> {
        let url = self.database_url.as_str();
        let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
        let (_, path) = rest.split_once('/')?;
        let name = path.split('?').next().unwrap_or(path);
        (!name.is_empty()).then_some(name)
    }

    /// Return a URL pointing at the `postgres` maintenance database on the
    /// same server. Used to issue `CREATE DATABASE` when the target database
    /// does not exist yet.
    pub fn maintenance_url(&self) -> String {
        match self.database_url.rfind('/') {
            Some(pos) => {
                let mut url = self.database_url[..pos].to_owned();
                url.push_str("/postgres");
                url
            }
            None => self.database_url.clone(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
