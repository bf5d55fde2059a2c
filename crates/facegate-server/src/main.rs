//! facegate server binary.
//!
//! Reads `facegate.toml` (or the path given with `--config`) plus `FACEGATE_*`
//! environment overrides, opens the SQLite store, and serves the JSON API
//! under `/api`.

mod settings;

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use facegate_oracle::HttpOracle;
use facegate_service::{AccessService, Broadcaster, ImageStore};
use facegate_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Face-verification access control server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "facegate.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let oracle = HttpOracle::from_config(&cfg.oracle)
    .with_context(|| format!("invalid oracle settings for {}", cfg.oracle.base_url))?;
  tracing::info!(
    base_url = %cfg.oracle.base_url,
    timeout_secs = cfg.oracle.timeout_secs,
    "recognition oracle configured"
  );

  let image_dir = expand_tilde(&cfg.image_dir);
  tokio::fs::create_dir_all(&image_dir)
    .await
    .with_context(|| format!("failed to create image directory {image_dir:?}"))?;

  let service = AccessService::new(
    Arc::new(store),
    Arc::new(oracle),
    Arc::new(Broadcaster::new(cfg.events.capacity)),
    ImageStore::new(image_dir),
    cfg.policy(),
  );

  let app = Router::new()
    .nest("/api", facegate_api::api_router(service))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "could not listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
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
