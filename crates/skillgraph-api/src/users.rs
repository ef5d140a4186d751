//! Handlers for per-user endpoints: coverage ledger, career path, gap
//! analysis and assessments.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/users/:user_id/competencies` | Every ledger row of the user |
//! | `GET`    | `/users/:user_id/competencies/:competency_id` | 404 if the user has no row |
//! | `POST`   | `/users/:user_id/competencies/:competency_id/evidence` | Body: `{"evidence":[...]}` |
//! | `GET`    | `/users/:user_id/career-path` | In declaration order |
//! | `POST`   | `/users/:user_id/career-path` | Body: `{"competency_id":"..."}` or `{"name":"..."}` |
//! | `DELETE` | `/users/:user_id/career-path/:competency_id` | |
//! | `GET`    | `/users/:user_id/gaps` | Broad by default; `?competency_ids=a,b` narrows |
//! | `POST`   | `/users/:user_id/assessments` | Body: [`Assessment`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::Deserialize;
use skillgraph_core::{
  assessment::GapReport,
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::Competency,
  user::{SkillEvidence, UserCompetency},
};
use skillgraph_engine::{
  Taxonomy,
  coverage::CoverageResult,
  gap::{Assessment, AssessmentOutcome, GapScope},
  resolver::CompetencyRef,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// `GET /users/:user_id/competencies`
pub async fn list<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<UserCompetency>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.user_competencies(user_id).await?))
}

/// `GET /users/:user_id/competencies/:competency_id`
pub async fn get_one<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path((user_id, competency_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UserCompetency>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.user_competency(user_id, competency_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct EvidenceBody {
  pub evidence: Vec<SkillEvidence>,
}

/// `POST /users/:user_id/competencies/:competency_id/evidence`
pub async fn record_evidence<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path((user_id, competency_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<EvidenceBody>,
) -> Result<Json<CoverageResult>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  let result = taxonomy
    .upsert_user_competency_evidence(user_id, competency_id, body.evidence)
    .await?;
  Ok(Json(result))
}

// ─── Career path ─────────────────────────────────────────────────────────────

/// `GET /users/:user_id/career-path`
pub async fn career_path<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Competency>>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.career_path(user_id).await?))
}

/// Either an existing competency id or a free-text name to resolve.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CareerPathBody {
  Id { competency_id: Uuid },
  Name { name: String },
}

impl From<CareerPathBody> for CompetencyRef {
  fn from(body: CareerPathBody) -> Self {
    match body {
      CareerPathBody::Id { competency_id } => CompetencyRef::Id(competency_id),
      CareerPathBody::Name { name } => CompetencyRef::Name(name),
    }
  }
}

/// `POST /users/:user_id/career-path`
pub async fn add_career_path<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<CareerPathBody>,
) -> Result<Json<Competency>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.add_career_path(user_id, body).await?))
}

/// `DELETE /users/:user_id/career-path/:competency_id`
pub async fn remove_career_path<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path((user_id, competency_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  if !taxonomy.remove_career_path(user_id, competency_id).await? {
    return Err(ApiError::NotFound(format!(
      "competency {competency_id} is not on the career path of {user_id}"
    )));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Gaps and assessments ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct GapParams {
  /// Comma-separated competency ids. Absent means the whole career path.
  pub competency_ids: Option<String>,
}

impl GapParams {
  fn scope(&self) -> Result<GapScope, ApiError> {
    let Some(ids) = &self.competency_ids else {
      return Ok(GapScope::Broad);
    };
    ids
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(|s| {
        Uuid::parse_str(s).map_err(|_| ApiError::BadRequest(format!("invalid competency id {s:?}")))
      })
      .collect::<Result<Vec<_>, _>>()
      .map(GapScope::Narrow)
  }
}

/// `GET /users/:user_id/gaps[?competency_ids=<id>,<id>]`
pub async fn gaps<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(user_id): Path<Uuid>,
  Query(params): Query<GapParams>,
) -> Result<Json<GapReport>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  let scope = params.scope()?;
  Ok(Json(taxonomy.compute_gap(user_id, &scope).await?))
}

/// `POST /users/:user_id/assessments`
pub async fn record_assessment<S, G, N>(
  State(taxonomy): State<Taxonomy<S, G, N>>,
  Path(user_id): Path<Uuid>,
  Json(assessment): Json<Assessment>,
) -> Result<Json<AssessmentOutcome>, ApiError>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  Ok(Json(taxonomy.record_assessment(user_id, assessment).await?))
}
