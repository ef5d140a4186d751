//! Handlers for `/competencies` and `/hierarchies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/competencies` | All competencies by name |
//! | `POST`   | `/competencies` | Body: `{"name":"..."}`; 201 when created, 200 when resolved |
//! | `GET`    | `/competencies/lookup` | `?name=`; never creates |
//! | `GET`    | `/competencies/:id` | 404 if not found |
//! | `DELETE` | `/competencies/:id` | Cascades through links and user rows |
//! | `GET`    | `/competencies/:id/aliases` | |
//! | `GET`    | `/competencies/:id/children` | |
//! | `POST`   | `/competencies/:id/children` | Body: `{"child_id":"..."}`; 422 on self-link or cycle |
//! | `DELETE` | `/competencies/:id/children/:child_id` | |
//! | `GET`    | `/competencies/:id/parents` | |
//! | `GET`    | `/competencies/:id/skills` | Directly linked skills |
//! | `POST`   | `/competencies/:id/skills` | Body: `{"name":"..."}` |
//! | `DELETE` | `/competencies/:id/skills/:skill_id` | |
//! | `GET`    | `/competencies/:id/mgs` | Required most-granular skills |
//! | `POST`   | `/competencies/:id/skill-tree` | Generate skills if there are none |
//! | `POST`   | `/hierarchies` | Body: `{"topic":"..."}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use skillgraph_core::{
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::{Competency, LinkOutcome, Skill},
};
use skillgraph_engine::{Taxonomy, aggregate::SkillTreeReport, hierarchy::HierarchyReport};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List / resolve ──────────────────────────────────────────────────────────

/// `GET /competencies`
pub async fn list<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
) -> Result<Json<Vec<Competency>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.list_competencies().await?))
}

#[derive(Debug, Deserialize)]
pub struct NameBody {
  pub name: String,
}

/// `POST /competencies`: runs the alias resolver, creating only when nothing
/// matches.
pub async fn resolve<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  let resolution = taxonomy.resolve_or_create_competency(&body.name).await?;
  let status = if resolution.is_created() { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(resolution)))
}

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub name: String,
}

/// `GET /competencies/lookup?name=<name>`
pub async fn lookup<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Competency>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.find_competency(params.name).await?))
}

// ─── Single competency ───────────────────────────────────────────────────────

/// `GET /competencies/:id`
pub async fn get_one<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Competency>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.competency(id).await?))
}

/// `DELETE /competencies/:id`
pub async fn delete_one<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  taxonomy.delete_competency(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /competencies/:id/aliases`
pub async fn aliases<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.competency_aliases(id).await?))
}

// ─── Hierarchy ───────────────────────────────────────────────────────────────

/// `GET /competencies/:id/children`
pub async fn children<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Competency>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.sub_competencies(id).await?))
}

/// `GET /competencies/:id/parents`
pub async fn parents<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Competency>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.parent_competencies(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct LinkChildBody {
  pub child_id: Uuid,
}

/// `POST /competencies/:id/children`
pub async fn link_child<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LinkChildBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  let outcome = taxonomy.link_subcompetency(id, body.child_id).await?;
  Ok((link_status(outcome), Json(outcome)))
}

/// `DELETE /competencies/:id/children/:child_id`
pub async fn unlink_child<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path((id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  if !taxonomy.unlink_subcompetency(id, child_id).await? {
    return Err(ApiError::NotFound(format!("no link from {id} to {child_id}")));
  }
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct TopicBody {
  pub topic: String,
}

/// `POST /hierarchies`
pub async fn build_hierarchy<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Json(body): Json<TopicBody>,
) -> Result<Json<HierarchyReport>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.build_hierarchy(&body.topic).await?))
}

// ─── Skills ──────────────────────────────────────────────────────────────────

/// `GET /competencies/:id/skills`
pub async fn skills<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Skill>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.linked_skills(id).await?))
}

/// `POST /competencies/:id/skills`, body: `{"name":"..."}`
pub async fn add_skill<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  let skill = taxonomy.add_skill(id, &body.name).await?;
  Ok((StatusCode::CREATED, Json(skill)))
}

/// `DELETE /competencies/:id/skills/:skill_id`
pub async fn unlink_skill<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path((id, skill_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  if !taxonomy.unlink_skill(id, skill_id).await? {
    return Err(ApiError::NotFound(format!("skill {skill_id} is not linked to {id}")));
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /competencies/:id/mgs`
pub async fn required_mgs<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Skill>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.required_mgs(id).await?))
}

/// `POST /competencies/:id/skill-tree`
pub async fn generate_skill_tree<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SkillTreeReport>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.generate_skill_tree(id).await?))
}

pub(crate) fn link_status(outcome: LinkOutcome) -> StatusCode {
  match outcome {
    LinkOutcome::Created => StatusCode::CREATED,
    LinkOutcome::Existing => StatusCode::OK,
  }
}
