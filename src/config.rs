//! Configuration loading for the leaderboard server.
//!
//! Loads configuration from TOML files and/or environment variables using figment.
//! Every key has a sensible default, so a bare `runboard serve` works out of
//! the box with SQLite in the data directory.
//!
//! # Configuration Sources (in order of priority, lowest to highest)
//!
//! 1. Default values (from `#[serde(default)]` attributes)
//! 2. TOML config file (if provided)
//! 3. Environment variables (prefix: `RUNBOARD_`, nested with `__`)
//!
//! # Environment Variable Naming
//!
//! Environment variables use the `RUNBOARD_` prefix with double-underscore for nesting:
//!
//! - `RUNBOARD_HTTP__LISTEN_ADDR` → `http.listen_addr`
//! - `RUNBOARD_DATABASE__PATH` → `database.path`
//! - `RUNBOARD_SITE__RUN_GOAL` → `site.run_goal`
//! - `RUNBOARD_ADMIN__SETTINGS_FILE` → `admin.settings_file`

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the leaderboard server.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Site-wide presentation settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Admin panel settings.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Address to listen on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upper bound on request bodies, which in practice means uploaded
    /// videos. Requests beyond this are rejected before buffering.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:5151".to_string()
}

fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

/// Site-wide presentation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Total-runs goal shown as a progress meter on the front page.
    #[serde(default = "default_run_goal")]
    pub run_goal: i64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            run_goal: default_run_goal(),
        }
    }
}

fn default_run_goal() -> i64 {
    100
}

/// Admin panel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    /// Settings file holding the admin credential record, as written by
    /// `runboard-passwd`. Relative paths resolve against the working
    /// directory, matching the credential utilities.
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,

    /// Idle lifetime of an admin session in seconds.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

fn default_settings_file() -> PathBuf {
    PathBuf::from(crate::settings::DEFAULT_SETTINGS_PATH)
}

fn default_session_timeout_secs() -> u64 {
    3600
}

// =============================================================================
// Database Configuration (compile-time feature selection)
// =============================================================================

/// SQLite database configuration (used when compiled with `sqlite` feature).
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    /// If not specified, defaults to `runboard.db` in the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// PostgreSQL database configuration (used when compiled with `postgres` feature).
#[cfg(feature = "postgres")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database host (default: "localhost")
    #[serde(default = "default_postgres_host")]
    pub host: String,

    /// Database port (default: 5432)
    #[serde(default = "default_postgres_port")]
    pub port: u16,

    /// Database user
    #[serde(default)]
    pub user: String,

    /// Database password
    #[serde(default)]
    pub password: String,

    /// Database name (default: "runboard")
    #[serde(default = "default_postgres_database")]
    pub database: String,
}

#[cfg(feature = "postgres")]
fn default_postgres_host() -> String {
    "localhost".to_string()
}

#[cfg(feature = "postgres")]
fn default_postgres_port() -> u16 {
    5432
}

#[cfg(feature = "postgres")]
fn default_postgres_database() -> String {
    "runboard".to_string()
}

#[cfg(feature = "postgres")]
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_postgres_host(),
            port: default_postgres_port(),
            user: String::new(),
            password: String::new(),
            database: default_postgres_database(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Configuration sources are merged in order (later sources override earlier):
    /// 1. TOML config file (if it exists)
    /// 2. Environment variables (prefix: `RUNBOARD_`, nested with `__`)
    ///
    /// # Example
    ///
    /// ```bash
    /// # Override listen address via environment variable
    /// export RUNBOARD_HTTP__LISTEN_ADDR=0.0.0.0:8080
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let mut figment = Figment::new();

        // Add TOML file if it exists
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        // Add environment variables (always, to allow overrides)
        figment = figment.merge(Env::prefixed("RUNBOARD_").split("__"));

        let config: Config = figment.extract().with_context(|| {
            format!(
                "Failed to load config from {} and environment",
                path.display()
            )
        })?;

        Ok(config)
    }

    /// Get the default config file path
    /// - macOS: ~/Library/Application Support/runboard/config.toml
    /// - Linux: ~/.config/runboard/config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("runboard")
            .join("config.toml")
    }

    /// Get the default data directory (for the SQLite file and logs)
    /// - macOS: ~/Library/Application Support/runboard/
    /// - Linux: ~/.local/share/runboard/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("runboard")
    }
}

/// Create a default configuration template
pub fn default_config_template() -> String {
    let data_dir = Config::default_data_dir();
    let data_dir_str = data_dir.display();

    format!(
        r#"# Runboard Configuration
# Data directory: {data_dir_str}

[http]
listen_addr = "0.0.0.0:5151"
# Request body cap; uploaded videos must fit under it (bytes).
# max_upload_bytes = 268435456

[site]
# Front-page progress meter counts total runs toward this goal.
run_goal = 100

[admin]
# Credential record written by `runboard-passwd`. Run the utility from the
# directory the server starts in, or point this at the file it wrote.
settings_file = ".env"
# Admin sessions expire after this many seconds of age.
session_timeout_secs = 3600

# =============================================================================
# Database Configuration
# =============================================================================
#
# The database backend is selected at compile time via cargo features:
#   - cargo build --features sqlite (default)
#   - cargo build --features postgres --no-default-features
#
# Configuration below depends on which feature was enabled at compile time.

# SQLite configuration (when compiled with --features sqlite)
[database]
# path = "{data_dir_str}/runboard.db"  # Optional, defaults to data_dir/runboard.db

# PostgreSQL configuration (when compiled with --features postgres)
# [database]
# host = "localhost"
# port = 5432
# user = "runboard"
# password = "secret"
# database = "runboard"
"#
    )
}
