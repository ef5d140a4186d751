//! JSON REST API for the skill taxonomy.
//!
//! Exposes an axum [`Router`] over a [`Taxonomy`] engine. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", skillgraph_api::api_router(taxonomy.clone()))
//! ```

pub mod competencies;
pub mod error;
pub mod skills;
pub mod users;

use axum::{
  Router,
  routing::{delete, get, post},
};
use skillgraph_core::{
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
};
use skillgraph_engine::Taxonomy;

pub use error::ApiError;

/// Build a fully-materialised API router for `taxonomy`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G, N>(taxonomy: Taxonomy<S, G, N>) -> Router<()>
where
  S: TaxonomyStore + 'static,
  G: TreeGenerator + 'static,
  N: Notifier,
{
  Router::new()
    // Competencies
    .route(
      "/competencies",
      get(competencies::list::<S, G, N>).post(competencies::resolve::<S, G, N>),
    )
    .route("/competencies/lookup", get(competencies::lookup::<S, G, N>))
    .route(
      "/competencies/{id}",
      get(competencies::get_one::<S, G, N>).delete(competencies::delete_one::<S, G, N>),
    )
    .route("/competencies/{id}/aliases", get(competencies::aliases::<S, G, N>))
    .route(
      "/competencies/{id}/children",
      get(competencies::children::<S, G, N>).post(competencies::link_child::<S, G, N>),
    )
    .route(
      "/competencies/{id}/children/{child_id}",
      delete(competencies::unlink_child::<S, G, N>),
    )
    .route("/competencies/{id}/parents", get(competencies::parents::<S, G, N>))
    .route(
      "/competencies/{id}/skills",
      get(competencies::skills::<S, G, N>).post(competencies::add_skill::<S, G, N>),
    )
    .route(
      "/competencies/{id}/skills/{skill_id}",
      delete(competencies::unlink_skill::<S, G, N>),
    )
    .route("/competencies/{id}/mgs", get(competencies::required_mgs::<S, G, N>))
    .route(
      "/competencies/{id}/skill-tree",
      post(competencies::generate_skill_tree::<S, G, N>),
    )
    .route("/hierarchies", post(competencies::build_hierarchy::<S, G, N>))
    // Skills
    .route("/skills/{id}", get(skills::get_one::<S, G, N>))
    .route(
      "/skills/{id}/subskills",
      get(skills::subskills::<S, G, N>).post(skills::add_subskill::<S, G, N>),
    )
    .route("/skills/{id}/mgs", get(skills::mgs::<S, G, N>))
    // Users
    .route("/users/{user_id}/competencies", get(users::list::<S, G, N>))
    .route(
      "/users/{user_id}/competencies/{competency_id}",
      get(users::get_one::<S, G, N>),
    )
    .route(
      "/users/{user_id}/competencies/{competency_id}/evidence",
      post(users::record_evidence::<S, G, N>),
    )
    .route(
      "/users/{user_id}/career-path",
      get(users::career_path::<S, G, N>).post(users::add_career_path::<S, G, N>),
    )
    .route(
      "/users/{user_id}/career-path/{competency_id}",
      delete(users::remove_career_path::<S, G, N>),
    )
    .route("/users/{user_id}/gaps", get(users::gaps::<S, G, N>))
    .route("/users/{user_id}/assessments", post(users::record_assessment::<S, G, N>))
    .with_state(taxonomy)
}

#[cfg(test)]
mod tests;
