//! Handlers for `/skills` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/skills/:id` | 404 if not found |
//! | `GET`  | `/skills/:id/subskills` | Direct children |
//! | `POST` | `/skills/:id/subskills` | Body: `{"name":"..."}`; 422 if it would close a cycle |
//! | `GET`  | `/skills/:id/mgs` | Leaves under the skill |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use skillgraph_core::{
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::Skill,
};
use skillgraph_engine::Taxonomy;
use uuid::Uuid;

use crate::{competencies::NameBody, error::ApiError};

/// `GET /skills/:id`
pub async fn get_one<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Skill>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.skill(id).await?))
}

/// `GET /skills/:id/subskills`
pub async fn subskills<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Skill>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.subskills(id).await?))
}

/// `POST /skills/:id/subskills`
pub async fn add_subskill<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  let skill = taxonomy.add_subskill(id, &body.name).await?;
  Ok((StatusCode::CREATED, Json(skill)))
}

/// `GET /skills/:id/mgs`
pub async fn mgs<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Skill>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.skill_mgs(id).await?))
}
