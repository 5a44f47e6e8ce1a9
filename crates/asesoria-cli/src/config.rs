//! Configuration file management for asesoria.
//!
//! Provides a TOML-based config file at `~/.config/asesoria/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use asesoria_db::config::DbConfig;

/// Environment variable holding the database URL.
pub const DATABASE_URL_ENV: &str = "ASESORIA_DATABASE_URL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the asesoria config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/asesoria` or
/// `~/.config/asesoria`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("asesoria");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("asesoria")
}

/// Return the path to the asesoria config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix, since the URL may carry a password.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct AsesoriaConfig {
    pub db_config: DbConfig,
}

impl AsesoriaConfig {
    /// Resolve configuration using the chain:
    /// `cli_db_url` > `ASESORIA_DATABASE_URL` > `config_file.database.url` > `DbConfig::DEFAULT_URL`.
    ///
    /// A missing config file is not an error; an unreadable one is.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let (db_url, origin) = if let Some(url) = cli_db_url {
            (url.to_owned(), "flag")
        } else if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            (url, "env")
        } else if config_path().exists() {
            (load_config()?.database.url, "config file")
        } else {
            (DbConfig::DEFAULT_URL.to_owned(), "default")
        };

        let db_config = DbConfig::new(db_url);
        debug!(
            origin,
            database = db_config.database_name().unwrap_or("?"),
            "resolved database url"
        );

        Ok(Self { db_config })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point the config lookup at an empty temp dir for the duration of `f`.
    fn with_isolated_config<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let out = f(tmp.path());

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        out
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();

        let loaded = with_isolated_config(|_| {
            let original = ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://testhost:5432/testdb".to_string(),
                },
            };
            save_config(&original).unwrap();
            load_config().unwrap()
        });

        assert_eq!(loaded.database.url, "postgresql://testhost:5432/testdb");
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();

        let mode = with_isolated_config(|_| {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://localhost:5432/asesoria".to_string(),
                },
            })
            .unwrap();
            std::fs::metadata(config_path()).unwrap().permissions().mode()
        });

        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var(DATABASE_URL_ENV, "postgresql://env:5432/envdb") };

        let config = AsesoriaConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();

        let url = with_isolated_config(|_| {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://file:5432/filedb".to_string(),
                },
            })
            .unwrap();
            unsafe { std::env::set_var(DATABASE_URL_ENV, "postgresql://env:5432/envdb") };
            let config = AsesoriaConfig::resolve(None);
            unsafe { std::env::remove_var(DATABASE_URL_ENV) };
            config.unwrap().db_config.database_url
        });

        assert_eq!(url, "postgresql://env:5432/envdb");
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();

        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
        let url = with_isolated_config(|_| {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://file:5432/filedb".to_string(),
                },
            })
            .unwrap();
            AsesoriaConfig::resolve(None).unwrap().db_config.database_url
        });

        assert_eq!(url, "postgresql://file:5432/filedb");
    }

    #[test]
    fn resolve_defaults_db_url_when_nothing_set() {
        let _lock = lock_env();

        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
        let url = with_isolated_config(|_| {
            AsesoriaConfig::resolve(None).unwrap().db_config.database_url
        });

        assert_eq!(url, DbConfig::DEFAULT_URL);
    }

    #[test]
    fn resolve_errors_on_malformed_config_file() {
        let _lock = lock_env();

        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
        let result = with_isolated_config(|dir| {
            let path = dir.join("asesoria").join("config.toml");
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "database = 3").unwrap();
            AsesoriaConfig::resolve(None)
        });

        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("failed to parse config file"), "unexpected error: {msg}");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("asesoria/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
