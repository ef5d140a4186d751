//! reqwest adapters for the engine's outbound ports.
//!
//! The generator service is expected to answer
//! `POST {base}/hierarchy {"topic": ...}` and
//! `POST {base}/skill-tree {"competency": ...}` with a nested
//! `{name, isCore, children}` tree. Events are posted as JSON to a single
//! endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::json;
use skillgraph_core::{
  port::{Notifier, TaxonomyEvent, TreeGenerator},
  tree::TreeNode,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
  #[error("request to {url} failed: {source}")]
  Request {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} returned {status}")]
  Status { url: String, status: StatusCode },
}

/// A client with the configured timeout.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
  Client::builder().timeout(timeout).build()
}

async fn post_json<B: Serialize + ?Sized>(
  client: &Client,
  url: String,
  body: &B,
) -> Result<reqwest::Response, HttpError> {
  let resp = match client.post(&url).json(body).send().await {
    Ok(resp) => resp,
    Err(source) => return Err(HttpError::Request { url, source }),
  };
  if !resp.status().is_success() {
    return Err(HttpError::Status { url, status: resp.status() });
  }
  Ok(resp)
}

// ─── Tree generator ──────────────────────────────────────────────────────────

/// Calls an external tree generator service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTreeGenerator {
  client:   Client,
  base_url: String,
}

impl HttpTreeGenerator {
  pub fn new(client: Client, base_url: impl Into<String>) -> Self {
    Self { client, base_url: base_url.into() }
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{path}", self.base_url.trim_end_matches('/'))
  }

  async fn fetch_tree(&self, path: &str, body: serde_json::Value) -> Result<TreeNode, HttpError> {
    let url = self.url(path);
    let resp = post_json(&self.client, url.clone(), &body).await?;
    resp
      .json()
      .await
      .map_err(|source| HttpError::Request { url, source })
  }
}

impl TreeGenerator for HttpTreeGenerator {
  type Error = HttpError;

  async fn generate_hierarchy(&self, topic: &str) -> Result<TreeNode, HttpError> {
    self.fetch_tree("hierarchy", json!({ "topic": topic })).await
  }

  async fn generate_skill_tree(&self, competency_name: &str) -> Result<TreeNode, HttpError> {
    self
      .fetch_tree("skill-tree", json!({ "competency": competency_name }))
      .await
  }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Posts each [`TaxonomyEvent`] to `url`; a no-op when no URL is configured.
#[derive(Clone)]
pub struct HttpNotifier {
  client: Client,
  url:    Option<String>,
}

impl HttpNotifier {
  pub fn new(client: Client, url: Option<String>) -> Self { Self { client, url } }
}

impl Notifier for HttpNotifier {
  type Error = HttpError;

  async fn notify(&self, event: TaxonomyEvent) -> Result<(), HttpError> {
    let Some(url) = &self.url else {
      return Ok(());
    };
    post_json(&self.client, url.clone(), &event).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{Json, Router, extract::State, http::StatusCode as AxumStatus, routing::post};
  use serde_json::Value;
  use skillgraph_core::user::ProficiencyLevel;
  use tokio::net::TcpListener;
  use uuid::Uuid;

  use super::*;

  /// Serve `app` on an ephemeral port and return its base URL.
  async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn client() -> Client { build_client(Duration::from_secs(5)).unwrap() }

  #[tokio::test]
  async fn generator_decodes_camel_case_trees() {
    let app = Router::new()
      .route(
        "/hierarchy",
        post(|Json(body): Json<Value>| async move {
          Json(json!({
            "name": body["topic"],
            "children": [{ "name": "Leaf", "isCore": true }]
          }))
        }),
      )
      .route("/skill-tree", post(|| async { AxumStatus::SERVICE_UNAVAILABLE }));
    let base = serve(app).await;
    let generator = HttpTreeGenerator::new(client(), format!("{base}/"));

    let tree = generator.generate_hierarchy("Rust").await.unwrap();
    assert_eq!(tree, TreeNode::named("Rust").with_children(vec![TreeNode::core("Leaf")]));

    let err = generator.generate_skill_tree("Rust").await.unwrap_err();
    assert!(matches!(err, HttpError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
  }

  #[tokio::test]
  async fn notifier_posts_events_and_noops_without_url() {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let app = Router::new()
      .route(
        "/events",
        post(|State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
          seen.lock().unwrap().push(body);
        }),
      )
      .with_state(received.clone());
    let base = serve(app).await;

    let event = TaxonomyEvent::CoverageUpdated {
      user_id:       Uuid::new_v4(),
      competency_id: Uuid::new_v4(),
      coverage:      62.5,
      proficiency:   ProficiencyLevel::Advanced,
    };
    HttpNotifier::new(client(), Some(format!("{base}/events")))
      .notify(event.clone())
      .await
      .unwrap();
    HttpNotifier::new(client(), None).notify(event).await.unwrap();

    let seen = received.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["event"], "coverage_updated");
    assert_eq!(seen[0]["proficiency"], "ADVANCED");
  }

  #[tokio::test]
  async fn unreachable_generator_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let generator = HttpTreeGenerator::new(client(), format!("http://{addr}"));
    let err = generator.generate_hierarchy("Rust").await.unwrap_err();
    assert!(matches!(err, HttpError::Request { .. }));
  }
}
