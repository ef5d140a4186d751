//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use skillgraph_engine::{Taxonomy, TaxonomyConfig};
use skillgraph_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Taxonomy::with_store(store, TaxonomyConfig::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json");
  let req = match body {
    Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

async fn create(app: &Router, name: &str) -> String {
  let (status, body) = send(app, "POST", "/competencies", Some(json!({ "name": name }))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["competency"]["competency_id"].as_str().unwrap().to_owned()
}

async fn add_skill(app: &Router, competency: &str, name: &str) -> String {
  let uri = format!("/competencies/{competency}/skills");
  let (status, body) = send(app, "POST", &uri, Some(json!({ "name": name }))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["skill_id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn resolve_creates_once_then_matches() {
  let app = app().await;
  let id = create(&app, "React").await;

  let (status, body) =
    send(&app, "POST", "/competencies", Some(json!({ "name": "react.js" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["resolution"], "found");
  assert_eq!(body["competency"]["competency_id"], id);

  let (status, body) = send(&app, "GET", "/competencies/lookup?name=REACT", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "React");

  let (_, aliases) = send(&app, "GET", &format!("/competencies/{id}/aliases"), None).await;
  assert_eq!(aliases, json!(["react js"]));
}

#[tokio::test]
async fn missing_competency_is_404_with_error_body() {
  let app = app().await;
  let (status, body) = send(&app, "GET", &format!("/competencies/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("competency"));

  let (status, _) = send(&app, "GET", "/competencies/lookup?name=nothing", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_links_are_422() {
  let app = app().await;
  let parent = create(&app, "Backend").await;
  let child = create(&app, "Messaging").await;
  let uri = format!("/competencies/{parent}/children");

  let (status, body) = send(&app, "POST", &uri, Some(json!({ "child_id": child }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body, "created");

  let (status, _) = send(&app, "POST", &uri, Some(json!({ "child_id": child }))).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(&app, "POST", &uri, Some(json!({ "child_id": parent }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let back = format!("/competencies/{child}/children");
  let (status, _) = send(&app, "POST", &back, Some(json!({ "child_id": parent }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = send(&app, "DELETE", &format!("{uri}/{child}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, "DELETE", &format!("{uri}/{child}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn evidence_coverage_and_gaps() {
  let app = app().await;
  let user = Uuid::new_v4();
  let frontend = create(&app, "Frontend").await;
  let html = add_skill(&app, &frontend, "HTML").await;
  let css = add_skill(&app, &frontend, "CSS").await;

  let (status, body) = send(
    &app,
    "POST",
    &format!("/users/{user}/career-path"),
    Some(json!({ "name": "frontend" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["competency_id"], frontend);

  let (status, body) = send(
    &app,
    "POST",
    &format!("/users/{user}/competencies/{frontend}/evidence"),
    Some(json!({ "evidence": [{ "skill_id": html, "skill_name": "HTML", "verified": true }] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["coverage"], 50.0);
  assert_eq!(body["proficiency_level"], "INTERMEDIATE");

  let (status, gaps) = send(&app, "GET", &format!("/users/{user}/gaps"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(gaps, json!({ "Frontend": [{ "skill_id": css, "skill_name": "CSS" }] }));

  let (_, row) =
    send(&app, "GET", &format!("/users/{user}/competencies/{frontend}"), None).await;
  assert_eq!(row["required_mgs_count"], 2);
  assert_eq!(row["verified_mgs_count"], 1);
}

#[tokio::test]
async fn failed_follow_up_narrows_over_http() {
  let app = app().await;
  let user = Uuid::new_v4();
  let frontend = create(&app, "Frontend").await;
  let backend = create(&app, "Backend").await;
  let html = add_skill(&app, &frontend, "HTML").await;
  add_skill(&app, &frontend, "CSS").await;
  add_skill(&app, &backend, "SQL").await;
  for id in [&frontend, &backend] {
    send(
      &app,
      "POST",
      &format!("/users/{user}/career-path"),
      Some(json!({ "competency_id": id })),
    )
    .await;
  }

  let (status, body) = send(
    &app,
    "POST",
    &format!("/users/{user}/assessments"),
    Some(json!({
      "kind": "follow_up",
      "passed": false,
      "results": [{
        "competency_id": frontend,
        "evidence": [{ "skill_id": html, "skill_name": "HTML", "verified": true }]
      }]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["mode"], "narrow");
  assert_eq!(body["gaps"].as_object().unwrap().len(), 1);
  assert!(body["gaps"]["Frontend"].is_array());

  let (_, broad) = send(&app, "GET", &format!("/users/{user}/gaps"), None).await;
  assert_eq!(broad.as_object().unwrap().len(), 2);

  let narrow_uri = format!("/users/{user}/gaps?competency_ids={backend}");
  let (_, narrow) = send(&app, "GET", &narrow_uri, None).await;
  assert_eq!(narrow.as_object().unwrap().keys().collect::<Vec<_>>(), ["Backend"]);
}

#[tokio::test]
async fn malformed_gap_scope_is_400() {
  let app = app().await;
  let uri = format!("/users/{}/gaps?competency_ids=not-a-uuid", Uuid::new_v4());
  let (status, body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
}

#[tokio::test]
async fn generation_without_generator_is_500() {
  let app = app().await;
  let (status, body) =
    send(&app, "POST", "/hierarchies", Some(json!({ "topic": "Rust" }))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert!(body["error"].is_string());

  let lonely = create(&app, "Lonely").await;
  let (status, mgs) = send(&app, "GET", &format!("/competencies/{lonely}/mgs"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(mgs, json!([]));
}

#[tokio::test]
async fn delete_competency_is_204_then_404() {
  let app = app().await;
  let id = create(&app, "Obsolete").await;
  let uri = format!("/competencies/{id}");
  assert_eq!(send(&app, "DELETE", &uri, None).await.0, StatusCode::NO_CONTENT);
  assert_eq!(send(&app, "DELETE", &uri, None).await.0, StatusCode::NOT_FOUND);
}
