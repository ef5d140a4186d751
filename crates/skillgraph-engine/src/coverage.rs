//! Recording verified evidence against a competency and propagating the
//! resulting coverage up the hierarchy.
//!
//! A competency's own row counts its full MGS set against the user's
//! evidence. An ancestor's row sums what its direct children contribute:
//! the stored counts of a child the user has a row for, otherwise the
//! child's MGS set counted against everything the user has verified.
//! Ancestors are refreshed children-first so every sum reads fresh rows.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use skillgraph_core::{
  port::{Notifier, TaxonomyEvent, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::Competency,
  user::{ProficiencyLevel, SkillEvidence, UserCompetency},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Error, Result, Taxonomy};

/// Outcome of [`Taxonomy::upsert_user_competency_evidence`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
  pub competency_id:     Uuid,
  pub coverage:          f64,
  pub proficiency_level: ProficiencyLevel,
  pub required_count:    u32,
  pub verified_count:    u32,
  /// Evidence entries dropped because they did not name a known MGS.
  pub rejected_evidence: Vec<Uuid>,
  /// Ancestors whose rows were refreshed, children first.
  pub ancestors_updated: Vec<Uuid>,
}

impl<S, G, N> Taxonomy<S, G, N>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  /// Merge `evidence` into the user's row for a competency, recompute its
  /// coverage and propagate to every ancestor.
  ///
  /// Only the competency's own row is part of the result's consistency;
  /// propagation failures are logged per ancestor and never fail the call.
  pub async fn upsert_user_competency_evidence(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
    evidence: Vec<SkillEvidence>,
  ) -> Result<CoverageResult> {
    let competency = self.competency(competency_id).await?;
    let (accepted, rejected_evidence) = self.partition_evidence(evidence).await?;

    let required = self
      .required_mgs_ids(&competency, self.config.generate_missing_skills)
      .await?;

    let row = self
      .store
      .merge_user_evidence(user_id, competency_id, accepted, &required)
      .await
      .map_err(Error::store)?;

    info!(
      %user_id,
      %competency_id,
      coverage = row.coverage,
      proficiency = %row.proficiency,
      required = row.required_mgs_count,
      verified = row.verified_mgs_count,
      "updated user competency"
    );
    self.notify_coverage(&row);

    let ancestors = self.propagate_coverage(user_id, competency_id).await;
    for ancestor in &ancestors {
      self.notify_coverage(ancestor);
    }

    Ok(CoverageResult {
      competency_id,
      coverage: row.coverage,
      proficiency_level: row.proficiency,
      required_count: row.required_mgs_count,
      verified_count: row.verified_mgs_count,
      rejected_evidence,
      ancestors_updated: ancestors.iter().map(|a| a.competency_id).collect(),
    })
  }

  pub async fn user_competencies(&self, user_id: Uuid) -> Result<Vec<UserCompetency>> {
    self
      .store
      .list_user_competencies(user_id)
      .await
      .map_err(Error::store)
  }

  pub async fn user_competency(&self, user_id: Uuid, competency_id: Uuid) -> Result<UserCompetency> {
    self
      .store
      .get_user_competency(user_id, competency_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| {
        Error::NotFound(format!("user {user_id} has no record for competency {competency_id}"))
      })
  }

  /// Every skill the user has verified, across all competencies.
  pub(crate) async fn user_verified_skills(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
    let rows = self.user_competencies(user_id).await?;
    Ok(rows.iter().flat_map(|r| r.verified_skill_ids()).collect())
  }

  /// Split evidence into entries naming an MGS and the ids of the rest.
  async fn partition_evidence(
    &self,
    evidence: Vec<SkillEvidence>,
  ) -> Result<(Vec<SkillEvidence>, Vec<Uuid>)> {
    let mut accepted = Vec::with_capacity(evidence.len());
    let mut rejected = Vec::new();
    for entry in evidence {
      if self.store.is_leaf_skill(entry.skill_id).await.map_err(Error::store)? {
        accepted.push(entry);
      } else {
        warn!(
          skill_id = %entry.skill_id,
          skill_name = %entry.skill_name,
          "dropping evidence for a skill that is not a most-granular skill"
        );
        rejected.push(entry.skill_id);
      }
    }
    Ok((accepted, rejected))
  }

  fn notify_coverage(&self, row: &UserCompetency) {
    self.notify(TaxonomyEvent::CoverageUpdated {
      user_id:       row.user_id,
      competency_id: row.competency_id,
      coverage:      row.coverage,
      proficiency:   row.proficiency,
    });
  }

  /// Refresh every ancestor of `start`. Returns the rows written.
  async fn propagate_coverage(&self, user_id: Uuid, start: Uuid) -> Vec<UserCompetency> {
    let verified = match self.user_verified_skills(user_id).await {
      Ok(verified) => verified,
      Err(e) => {
        warn!(%user_id, error = %e, "cannot load user evidence; skipping propagation");
        return Vec::new();
      }
    };

    let (ancestors, edges) = self.collect_ancestors(start).await;
    let mut updated = Vec::with_capacity(ancestors.len());
    for ancestor in order_children_first(ancestors, &edges) {
      match self.refresh_ancestor(user_id, &ancestor, &verified).await {
        Ok(row) => {
          debug!(
            %user_id,
            competency_id = %ancestor.competency_id,
            coverage = row.coverage,
            "propagated coverage"
          );
          updated.push(row);
        }
        Err(e) => warn!(
          %user_id,
          competency_id = %ancestor.competency_id,
          error = %e,
          "failed to propagate coverage to ancestor"
        ),
      }
    }
    updated
  }

  /// Breadth-first walk up the link table. Returns the ancestors in
  /// discovery order and the `(child, parent)` edges between them.
  async fn collect_ancestors(&self, start: Uuid) -> (Vec<Competency>, Vec<(Uuid, Uuid)>) {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut ancestors = Vec::new();
    let mut edges = Vec::new();

    while let Some(id) = queue.pop_front() {
      let parents = match self.store.get_parent_competencies(id).await {
        Ok(parents) => parents,
        Err(e) => {
          warn!(competency_id = %id, error = %e, "failed to load parents during propagation");
          continue;
        }
      };
      for parent in parents {
        let parent_id = parent.competency_id;
        if parent_id == start {
          warn!(competency_id = %start, "competency is its own ancestor");
          continue;
        }
        edges.push((id, parent_id));
        if visited.insert(parent_id) {
          queue.push_back(parent_id);
          ancestors.push(parent);
        }
      }
    }
    (ancestors, edges)
  }

  async fn refresh_ancestor(
    &self,
    user_id: Uuid,
    ancestor: &Competency,
    verified: &HashSet<Uuid>,
  ) -> Result<UserCompetency> {
    let children = self
      .store
      .find_children(ancestor.competency_id)
      .await
      .map_err(Error::store)?;

    let (mut required, mut covered) = (0usize, 0usize);
    for child in children {
      let row = self
        .store
        .get_user_competency(user_id, child.competency_id)
        .await
        .map_err(Error::store)?;
      match row {
        Some(row) => {
          required += row.required_mgs_count as usize;
          covered += row.verified_mgs_count as usize;
        }
        None => {
          let mgs = self.required_mgs_ids(&child, false).await?;
          required += mgs.len();
          covered += mgs.intersection(verified).count();
        }
      }
    }

    let mut row = self
      .store
      .ensure_user_competency(user_id, ancestor.competency_id)
      .await
      .map_err(Error::store)?;
    row.apply_counts(required, covered);
    self.store.save_user_competency(&row).await.map_err(Error::store)?;
    Ok(row)
  }
}

/// Kahn's algorithm over the ancestor set: a competency comes after every
/// child of it that is also being refreshed. Ancestors stuck on a cycle are
/// appended in discovery order.
fn order_children_first(ancestors: Vec<Competency>, edges: &[(Uuid, Uuid)]) -> Vec<Competency> {
  let members: HashSet<Uuid> = ancestors.iter().map(|c| c.competency_id).collect();
  let mut pending: HashMap<Uuid, usize> = HashMap::new();
  let mut parents_of: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
  for &(child, parent) in edges {
    if members.contains(&child) {
      *pending.entry(parent).or_default() += 1;
      parents_of.entry(child).or_default().push(parent);
    }
  }

  let mut by_id: HashMap<Uuid, Competency> =
    ancestors.iter().map(|c| (c.competency_id, c.clone())).collect();
  let mut ready: VecDeque<Uuid> = ancestors
    .iter()
    .map(|c| c.competency_id)
    .filter(|id| pending.get(id).copied().unwrap_or(0) == 0)
    .collect();

  let mut ordered = Vec::with_capacity(ancestors.len());
  while let Some(id) = ready.pop_front() {
    if let Some(competency) = by_id.remove(&id) {
      ordered.push(competency);
    }
    for parent in parents_of.get(&id).into_iter().flatten() {
      if let Some(count) = pending.get_mut(parent) {
        *count -= 1;
        if *count == 0 {
          ready.push_back(*parent);
        }
      }
    }
  }

  let stuck: Vec<Competency> = ancestors
    .into_iter()
    .filter(|c| by_id.contains_key(&c.competency_id))
    .collect();
  if !stuck.is_empty() {
    warn!(count = stuck.len(), "ancestor cycle; refreshing remaining ancestors in discovery order");
    ordered.extend(stuck);
  }
  ordered
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use skillgraph_core::taxonomy::CompetencySource;

  use super::*;

  fn competency(name: &str) -> Competency {
    Competency {
      competency_id:    Uuid::new_v4(),
      name:             name.to_owned(),
      normalized_name:  name.to_lowercase(),
      description:      None,
      legacy_parent_id: None,
      source:           CompetencySource::Manual,
      created_at:       Utc::now(),
    }
  }

  fn names(ordered: &[Competency]) -> Vec<&str> {
    ordered.iter().map(|c| c.name.as_str()).collect()
  }

  #[test]
  fn diamond_is_ordered_children_first() {
    // start -> b, start -> c, b -> a, c -> a, discovered as [b, c, a]
    let start = Uuid::new_v4();
    let (b, c, a) = (competency("b"), competency("c"), competency("a"));
    let edges = [
      (start, b.competency_id),
      (start, c.competency_id),
      (b.competency_id, a.competency_id),
      (c.competency_id, a.competency_id),
    ];
    let ordered = order_children_first(vec![b, c, a], &edges);
    assert_eq!(names(&ordered), ["b", "c", "a"]);
  }

  #[test]
  fn later_discovered_child_still_precedes_its_parent() {
    // start -> x -> top, start -> y -> z -> top; top is found before z.
    let start = Uuid::new_v4();
    let (x, y, top, z) = (competency("x"), competency("y"), competency("top"), competency("z"));
    let edges = [
      (start, x.competency_id),
      (start, y.competency_id),
      (x.competency_id, top.competency_id),
      (y.competency_id, z.competency_id),
      (z.competency_id, top.competency_id),
    ];
    let ordered = order_children_first(vec![x, y, top, z], &edges);
    let pos = |n: &str| names(&ordered).iter().position(|m| *m == n).unwrap();
    assert!(pos("z") < pos("top"));
    assert!(pos("x") < pos("top"));
    assert_eq!(ordered.len(), 4);
  }

  #[test]
  fn cycle_members_are_appended() {
    let start = Uuid::new_v4();
    let (p, q) = (competency("p"), competency("q"));
    let edges = [
      (start, p.competency_id),
      (p.competency_id, q.competency_id),
      (q.competency_id, p.competency_id),
    ];
    let ordered = order_children_first(vec![p, q], &edges);
    assert_eq!(names(&ordered), ["p", "q"]);
  }
}
