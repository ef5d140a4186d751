//! The `TaxonomyStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `skillgraph-store-sqlite`). The engine is generic over this abstraction and
//! never names a concrete backend.
//!
//! There is no locking in the contract. Every create is a find-or-create keyed
//! on the normalised name and every link write is link-if-absent, so
//! concurrent duplicate writes converge on one persisted row.

use std::{collections::HashSet, future::Future};

use uuid::Uuid;

use crate::{
  taxonomy::{
    Competency, CompetencySubcompetencyLink, LinkOutcome, NewCompetency, NewSkill,
    Skill,
  },
  user::{CareerPathEntry, SkillEvidence, UserCompetency},
};

/// Abstraction over a taxonomy store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TaxonomyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Competencies ──────────────────────────────────────────────────────

  /// Return the competency whose normalised name matches `input`, creating it
  /// if absent. The boolean is `true` when this call inserted the row.
  fn find_or_create_competency(
    &self,
    input: NewCompetency,
  ) -> impl Future<Output = Result<(Competency, bool), Self::Error>> + Send + '_;

  fn get_competency(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Competency>, Self::Error>> + Send + '_;

  /// Look up by name. `name` is normalised by the store.
  fn find_competency_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Competency>, Self::Error>> + Send + 'a;

  /// Look up through a registered alias. `alias` is normalised by the store.
  fn find_competency_by_alias<'a>(
    &'a self,
    alias: &'a str,
  ) -> impl Future<Output = Result<Option<Competency>, Self::Error>> + Send + 'a;

  /// Competencies whose normalised name contains `fragment`.
  fn find_competencies_like<'a>(
    &'a self,
    fragment: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Competency>, Self::Error>> + Send + 'a;

  /// Competencies whose name, with separators removed, occurs inside the
  /// compact form of `name`. Longest match first.
  fn find_competencies_within<'a>(
    &'a self,
    name: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Competency>, Self::Error>> + Send + 'a;

  fn list_competencies(
    &self,
  ) -> impl Future<Output = Result<Vec<Competency>, Self::Error>> + Send + '_;

  /// Persist the mutable fields (description, legacy parent, source) of an
  /// existing competency.
  fn update_competency<'a>(
    &'a self,
    competency: &'a Competency,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a competency, cascading through links, aliases, user rows and
  /// career-path entries. Returns `false` if it did not exist.
  fn delete_competency(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Register `alias` (normalised by the store) for a competency. Returns
  /// `false` if the alias was already registered.
  fn add_competency_alias<'a>(
    &'a self,
    competency_id: Uuid,
    alias: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn list_competency_aliases(
    &self,
    competency_id: Uuid,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Competency hierarchy ──────────────────────────────────────────────

  /// Direct sub-competencies through the link table.
  fn find_children(
    &self,
    parent_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Competency>, Self::Error>> + Send + '_;

  /// Direct parents through the link table.
  fn get_parent_competencies(
    &self,
    child_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Competency>, Self::Error>> + Send + '_;

  fn get_subcompetency_links(
    &self,
    parent_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CompetencySubcompetencyLink>, Self::Error>>
  + Send
  + '_;

  /// Link-if-absent. Performs no cycle check; that is the caller's job.
  fn link_subcompetency(
    &self,
    parent_id: Uuid,
    child_id: Uuid,
  ) -> impl Future<Output = Result<LinkOutcome, Self::Error>> + Send + '_;

  /// Returns `false` if no such link existed.
  fn unlink_subcompetency(
    &self,
    parent_id: Uuid,
    child_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Skills ────────────────────────────────────────────────────────────

  /// Return the skill whose normalised name matches `input`, creating it if
  /// absent. The boolean is `true` when this call inserted the row.
  fn find_or_create_skill(
    &self,
    input: NewSkill,
  ) -> impl Future<Output = Result<(Skill, bool), Self::Error>> + Send + '_;

  fn get_skill(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Skill>, Self::Error>> + Send + '_;

  /// Hydrate many skills at once. Unknown ids are skipped; order is by name.
  fn get_skills<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + 'a;

  fn find_skill_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Skill>, Self::Error>> + Send + 'a;

  /// Delete a skill and every link touching it.
  fn delete_skill(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Link-if-absent in the skill hierarchy. No cycle check.
  fn link_subskill(
    &self,
    parent_skill_id: Uuid,
    child_skill_id: Uuid,
  ) -> impl Future<Output = Result<LinkOutcome, Self::Error>> + Send + '_;

  /// Direct children of a skill.
  fn get_subskills(
    &self,
    parent_skill_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + '_;

  /// Direct parents of a skill through the link table.
  fn find_skill_parents(
    &self,
    child_skill_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + '_;

  /// `true` if the skill exists and has no children.
  fn is_leaf_skill(
    &self,
    skill_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Competency ↔ skill ────────────────────────────────────────────────

  fn link_skill(
    &self,
    competency_id: Uuid,
    skill_id: Uuid,
  ) -> impl Future<Output = Result<LinkOutcome, Self::Error>> + Send + '_;

  fn unlink_skill(
    &self,
    competency_id: Uuid,
    skill_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Top-level skills linked directly to a competency.
  fn get_linked_skills(
    &self,
    competency_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + '_;

  // ── User ledger ───────────────────────────────────────────────────────

  fn get_user_competency(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserCompetency>, Self::Error>> + Send + '_;

  fn list_user_competencies(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserCompetency>, Self::Error>> + Send + '_;

  /// Return the row for `(user_id, competency_id)`, inserting a zero-coverage
  /// row if there is none.
  fn ensure_user_competency(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
  ) -> impl Future<Output = Result<UserCompetency, Self::Error>> + Send + '_;

  /// In one atomic step: ensure the row for `(user_id, competency_id)`, merge
  /// `evidence` into it (see [`UserCompetency::merge_evidence`]) and recount
  /// its coverage against `required`. Concurrent merges on the same row never
  /// lose each other's evidence.
  fn merge_user_evidence<'a>(
    &'a self,
    user_id: Uuid,
    competency_id: Uuid,
    evidence: Vec<SkillEvidence>,
    required: &'a HashSet<Uuid>,
  ) -> impl Future<Output = Result<UserCompetency, Self::Error>> + Send + 'a;

  /// Overwrite coverage, counts and evidence of an existing row.
  fn save_user_competency<'a>(
    &'a self,
    row: &'a UserCompetency,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Career path ───────────────────────────────────────────────────────

  /// Returns `false` if the entry already existed.
  fn add_career_path(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn remove_career_path(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Entries in the order they were declared.
  fn list_career_path(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CareerPathEntry>, Self::Error>> + Send + '_;
}
