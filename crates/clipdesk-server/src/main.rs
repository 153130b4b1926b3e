//! clipdesk server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `CLIPDESK__*` environment variables over it, opens the SQLite store, and
//! serves the dashboard API over HTTP.
//!
//! # Bootstrapping an admin
//!
//! ```
//! cargo run -p clipdesk-server --bin server -- --create-admin ops@example.com
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use clipdesk_core::{referrer::NewAdmin, store::DashboardStore};
use clipdesk_server::{AppState, ServerConfig, auth};
use clipdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "clipdesk dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create an admin with this email (password read from stdin) and exit.
  #[arg(long, value_name = "EMAIL")]
  create_admin: Option<String>,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    println!("{}", auth::hash_password(&password)?);
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("CLIPDESK")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("allowed_origins")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in filesystem paths.
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.artifact_dir = expand_tilde(&server_cfg.artifact_dir);

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let state = AppState::new(Arc::new(store), server_cfg.clone())
    .context("failed to configure mail transport")?;

  // Helper mode: create an admin and exit.
  if let Some(email) = cli.create_admin {
    let password = read_password()?;
    let admin = state
      .store
      .add_admin(
        NewAdmin {
          email,
          password_hash: auth::hash_password(&password)?,
          display_name: None,
        },
        &state.links,
      )
      .await
      .context("failed to create admin")?;
    println!("{}", admin.form_link);
    return Ok(());
  }

  if server_cfg.allowed_origins.is_empty() {
    tracing::warn!("no allowed_origins configured; the public form will reject every request");
  }
  if state.uploads.is_none() {
    tracing::info!("uploads not configured; /api/upload-url will answer 503");
  }

  let app = clipdesk_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
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
