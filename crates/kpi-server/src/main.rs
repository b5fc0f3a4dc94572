//! kpi-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite database, and serves the KPI JSON API over HTTP.
//!
//! # Importing records
//!
//! Load a JSON array of view rows into the backing tables and exit:
//!
//! ```
//! cargo run -p kpi-server -- --import-kpi kpi.json --import-turnover turnover.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Datelike as _;
use clap::Parser;
use kpi_server::ServerConfig;
use kpi_store_sqlite::SqliteSource;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Retail KPI reporting server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Import monthly KPI rows from a JSON array file, then exit.
  #[arg(long, value_name = "FILE")]
  import_kpi: Option<PathBuf>,

  /// Import turnover-by-job-title rows from a JSON array file, then exit.
  #[arg(long, value_name = "FILE")]
  import_turnover: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("KPI"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in the database path.
  let database_path = expand_tilde(&server_cfg.database_path);

  let source = SqliteSource::open(&database_path)
    .await
    .with_context(|| format!("failed to open database at {database_path:?}"))?;

  // Import mode: load rows and exit.
  if cli.import_kpi.is_some() || cli.import_turnover.is_some() {
    if let Some(path) = &cli.import_kpi {
      let json = read_file(path)?;
      let count = source
        .import_period_json(&json)
        .await
        .with_context(|| format!("failed to import KPI rows from {path:?}"))?;
      tracing::info!(count, path = %path.display(), "imported KPI records");
    }
    if let Some(path) = &cli.import_turnover {
      let json = read_file(path)?;
      let count = source
        .import_turnover_json(&json)
        .await
        .with_context(|| format!("failed to import turnover rows from {path:?}"))?;
      tracing::info!(count, path = %path.display(), "imported turnover records");
    }
    return Ok(());
  }

  let default_year = server_cfg
    .reporting_year(chrono::Local::now().year())
    .context("invalid default_year")?;

  let app = kpi_server::app(Arc::new(source), &server_cfg, default_year);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(%default_year, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
  std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
