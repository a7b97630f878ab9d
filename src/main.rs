//! Run leaderboard server - Main entry point
//!
//! The runboard daemon serves the public leaderboard site and the admin
//! panel. Admin credentials are provisioned separately with runboard-passwd.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use runboard::config::{self, Config};
use runboard::credentials::AdminCredentials;
use runboard::db::Database;
use runboard::server;
use runboard::state::AppState;

/// Run leaderboard server - tracks timed runs with video evidence
#[derive(Parser)]
#[command(name = "runboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Data directory for the database and logs
    #[arg(short, long, default_value_os_t = Config::default_data_dir())]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the leaderboard daemon
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Generate a default configuration file
    InitConfig {
        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on command type
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    match cli.command {
        Commands::Serve { listen } => {
            // For daemon mode: log to both stdout and file with rotation
            init_daemon_logging(&cli.data_dir, filter)?;
            serve(&cli.config, &cli.data_dir, listen).await
        }
        Commands::InitConfig { output } => {
            init_cli_logging(filter);
            generate_config(output)
        }
    }
}

/// Initialize logging for CLI commands (stdout only).
fn init_cli_logging(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Initialize logging for daemon mode (stdout + rotating file).
fn init_daemon_logging(data_dir: &PathBuf, filter: EnvFilter) -> Result<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Create a daily rotating file appender (e.g., runboard.2026-01-15.log)
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("runboard")
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| "Failed to create log file appender")?;

    // Non-blocking writer for the file
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep the writer alive for the lifetime of the program
    // This is intentional for a long-running daemon
    std::mem::forget(_guard);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false)) // stdout
        .with(fmt::layer().with_target(true).with_ansi(false).with_writer(non_blocking)) // file
        .init();

    info!("Logging to: {}", log_dir.display());
    Ok(())
}

/// Run the leaderboard daemon
async fn serve(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    listen_override: Option<SocketAddr>,
) -> Result<()> {
    ensure_data_dir(data_dir)?;

    let config = Config::load(config_path)?;

    // Determine listen address
    let listen_addr: SocketAddr = match listen_override {
        Some(addr) => addr,
        None => config.http.listen_addr.parse().with_context(|| {
            format!(
                "Invalid listen address in config: {}",
                config.http.listen_addr
            )
        })?,
    };

    // The admin panel cannot work without a credential record, so fail
    // fast and point at runboard-passwd instead of 500ing on first login.
    let credentials = AdminCredentials::load(&config.admin.settings_file)
        .context("Failed to load admin credentials")?;

    let db = Database::new(&config.database, data_dir).await?;

    info!("Run leaderboard starting...");
    info!("Listening on: {}", listen_addr);
    info!(
        "Admin login verifies against a {}-iteration PBKDF2 record",
        credentials.iterations()
    );

    let state = AppState::new(config, db.pool(), credentials);

    server::run(state, listen_addr).await
}

/// Ensure data directory exists
fn ensure_data_dir(data_dir: &PathBuf) -> Result<()> {
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        info!("Created data directory: {}", data_dir.display());
    }
    Ok(())
}

/// Generate a default configuration file
fn generate_config(output: Option<PathBuf>) -> Result<()> {
    let config = config::default_config_template();

    match output {
        Some(path) => {
            std::fs::write(&path, &config)?;
            println!("Configuration written to: {}", path.display());
        }
        None => {
            print!("{}", config);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["runboard", "serve", "--listen", "0.0.0.0:9151"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { listen: Some(addr) } if addr.port() == 9151
        ));

        let cli = Cli::try_parse_from(["runboard", "init-config"]).unwrap();
        assert!(matches!(cli.command, Commands::InitConfig { output: None }));

        assert!(Cli::try_parse_from(["runboard", "serve", "--listen", "not-an-address"]).is_err());
    }

    #[test]
    fn test_ensure_data_dir_creates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("data");

        ensure_data_dir(&dir).unwrap();
        assert!(dir.is_dir());

        ensure_data_dir(&dir).unwrap();
    }

    #[test]
    fn test_generate_config_writes_template() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runboard.toml");

        generate_config(Some(path.clone())).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[http]"));
        assert!(written.contains("listen_addr"));
    }
}
