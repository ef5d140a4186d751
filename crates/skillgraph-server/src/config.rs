//! Runtime configuration, layered from a TOML file and `SKILLGRAPH_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use skillgraph_engine::TaxonomyConfig;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Base URL of the tree generator service.
  pub generator_url:        String,
  /// Endpoint receiving taxonomy events. Events are dropped when unset.
  #[serde(default)]
  pub notify_url:           Option<String>,
  #[serde(default = "default_timeout")]
  pub request_timeout_secs: u64,
  #[serde(default)]
  pub taxonomy:             TaxonomyConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_timeout() -> u64 { 30 }

impl ServerConfig {
  /// Read `path` (optional) overlaid by the environment. Nested keys use a
  /// double underscore, e.g. `SKILLGRAPH_TAXONOMY__ALIAS_THRESHOLD=90`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SKILLGRAPH")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }

  /// Listen address as `host:port`.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn minimal_file_takes_defaults() {
    let cfg = parse(
      r#"
        store_path = "taxonomy.db"
        generator_url = "http://localhost:9000"
      "#,
    );
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.notify_url, None);
    assert_eq!(cfg.taxonomy, TaxonomyConfig::default());
  }

  #[test]
  fn taxonomy_table_overrides_some_fields() {
    let cfg = parse(
      r#"
        port = 9090
        store_path = "taxonomy.db"
        generator_url = "http://localhost:9000"
        notify_url = "http://localhost:9100/events"

        [taxonomy]
        alias_threshold = 90
        generate_missing_skills = false
      "#,
    );
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.notify_url.as_deref(), Some("http://localhost:9100/events"));
    assert_eq!(cfg.taxonomy.alias_threshold, 90);
    assert!(!cfg.taxonomy.generate_missing_skills);
    assert_eq!(cfg.taxonomy.candidate_limit, 50);
  }

  #[test]
  fn missing_generator_url_is_an_error() {
    let result = config::Config::builder()
      .add_source(config::File::from_str(r#"store_path = "x.db""#, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }
}
