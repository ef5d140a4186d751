//! HTTP server assembly for the skill taxonomy: configuration, the reqwest
//! adapters behind the engine's ports, and the top-level router.

pub mod config;
pub mod http;

use axum::{Router, routing::get};
use skillgraph_core::{
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
};
use skillgraph_engine::Taxonomy;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use http::{HttpError, HttpNotifier, HttpTreeGenerator};

/// The JSON API under `/api` plus a `/healthz` probe, with request tracing.
pub fn router<S, G, N>(taxonomy: Taxonomy<S, G, N>) -> Router
where
  S: TaxonomyStore + 'static,
  G: TreeGenerator + 'static,
  N: Notifier,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", skillgraph_api::api_router(taxonomy))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use skillgraph_engine::TaxonomyConfig;
  use skillgraph_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[tokio::test]
  async fn api_is_nested_and_health_responds() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(Taxonomy::with_store(store, TaxonomyConfig::default()));

    let resp = app
      .clone()
      .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/api/competencies").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"[]");
  }
}
