//! skillgraph server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, wires the HTTP tree generator and notifier into the taxonomy engine,
//! and serves the JSON API.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use skillgraph_engine::Taxonomy;
use skillgraph_server::{HttpNotifier, HttpTreeGenerator, ServerConfig, http::build_client};
use skillgraph_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Skill taxonomy server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "SKILLGRAPH_CONFIG", default_value = "config.toml")]
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

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let client = build_client(server_cfg.request_timeout()).context("failed to build HTTP client")?;
  let generator = HttpTreeGenerator::new(client.clone(), server_cfg.generator_url.clone());
  let notifier = HttpNotifier::new(client, server_cfg.notify_url.clone());
  if server_cfg.notify_url.is_none() {
    tracing::info!("notify_url not set; taxonomy events will be dropped");
  }

  let taxonomy = Taxonomy::new(
    Arc::new(store),
    Arc::new(generator),
    Arc::new(notifier),
    server_cfg.taxonomy.clone(),
  );
  let app = skillgraph_server::router(taxonomy);

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
