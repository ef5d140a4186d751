//! Building the competency hierarchy from generated topic trees, and the
//! guarded link operations underneath it.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use skillgraph_core::{
  name::normalize_name,
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::{Competency, CompetencySource, LinkOutcome},
  tree::{TreeAnomaly, TreeNode, flatten},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, Result, Taxonomy};

/// Counts from one [`Taxonomy::build_hierarchy`] run.
///
/// Re-running the same tree yields `created == 0` and
/// `relationships_created == 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyReport {
  pub created:                usize,
  pub existing:               usize,
  pub relationships_created:  usize,
  pub relationships_existing: usize,
  /// Links refused because they would be self-links or close a cycle.
  pub relationships_rejected: usize,
  /// Subtrees dropped during validation.
  pub skipped:                Vec<TreeAnomaly>,
}

impl<S, G, N> Taxonomy<S, G, N>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  /// Generate a hierarchy for `topic` and merge it into the taxonomy.
  pub async fn build_hierarchy(&self, topic: &str) -> Result<HierarchyReport> {
    let topic = topic.trim();
    if topic.is_empty() {
      return Err(Error::Validation("topic is empty".to_owned()));
    }
    let tree = self
      .generator
      .generate_hierarchy(topic)
      .await
      .map_err(Error::generator)?;
    self.merge_hierarchy(&tree).await
  }

  /// Merge an already generated hierarchy.
  ///
  /// Invalid subtrees are dropped whole and reported; the rest is persisted.
  /// Every node goes through alias resolution, so re-running a tree, or a
  /// tree that names an existing competency differently, converges on the
  /// rows already there.
  pub async fn merge_hierarchy(&self, tree: &TreeNode) -> Result<HierarchyReport> {
    let flat = flatten(tree);
    for anomaly in &flat.anomalies {
      warn!(
        parent = ?anomaly.parent,
        reason = %anomaly.reason,
        skipped_nodes = anomaly.skipped_nodes,
        "dropping invalid subtree from generated hierarchy"
      );
    }
    if flat.nodes.is_empty() {
      return Err(Error::Validation("generated hierarchy has no valid root".to_owned()));
    }

    let mut report = HierarchyReport { skipped: flat.anomalies, ..Default::default() };
    let mut ids: HashMap<String, Uuid> = HashMap::new();

    // Pre-order: a parent is always resolved before its children.
    for node in &flat.nodes {
      let resolution = self.resolve_with_source(&node.name, CompetencySource::Hierarchy).await?;
      if resolution.is_created() {
        report.created += 1;
      } else {
        report.existing += 1;
      }
      let child_id = resolution.competency().competency_id;
      ids.insert(normalize_name(&node.name), child_id);

      let Some(parent) = &node.parent else { continue };
      let Some(&parent_id) = ids.get(&normalize_name(parent)) else { continue };
      match self.link_subcompetency(parent_id, child_id).await {
        Ok(LinkOutcome::Created) => report.relationships_created += 1,
        Ok(LinkOutcome::Existing) => report.relationships_existing += 1,
        Err(Error::Validation(reason)) => {
          warn!(%parent, child = %node.name, %reason, "rejected generated link");
          report.relationships_rejected += 1;
        }
        Err(e) => return Err(e),
      }
    }

    info!(
      root = %flat.nodes[0].name,
      created = report.created,
      existing = report.existing,
      relationships_created = report.relationships_created,
      relationships_existing = report.relationships_existing,
      "merged competency hierarchy"
    );
    Ok(report)
  }

  /// Link `child_id` under `parent_id`.
  ///
  /// Refuses self-links and links that would make a competency its own
  /// ancestor. A newly placed child with no legacy parent gets `parent_id`
  /// written into that cache.
  pub async fn link_subcompetency(&self, parent_id: Uuid, child_id: Uuid) -> Result<LinkOutcome> {
    if parent_id == child_id {
      return Err(Error::Validation(format!(
        "competency {parent_id} cannot be its own sub-competency"
      )));
    }
    self.competency(parent_id).await?;
    let child = self.competency(child_id).await?;

    if self.is_descendant(child_id, parent_id).await? {
      return Err(Error::Validation(format!(
        "linking {child_id} under {parent_id} would create a cycle"
      )));
    }

    let outcome = self
      .store
      .link_subcompetency(parent_id, child_id)
      .await
      .map_err(Error::store)?;

    if outcome.is_created() && child.legacy_parent_id.is_none() {
      let mut child = child;
      child.legacy_parent_id = Some(parent_id);
      if let Err(e) = self.store.update_competency(&child).await {
        warn!(competency_id = %child_id, error = %e, "failed to fill legacy parent");
      }
    }
    Ok(outcome)
  }

  /// Returns `false` if the link did not exist.
  pub async fn unlink_subcompetency(&self, parent_id: Uuid, child_id: Uuid) -> Result<bool> {
    self
      .store
      .unlink_subcompetency(parent_id, child_id)
      .await
      .map_err(Error::store)
  }

  pub async fn sub_competencies(&self, id: Uuid) -> Result<Vec<Competency>> {
    self.competency(id).await?;
    self.store.find_children(id).await.map_err(Error::store)
  }

  pub async fn parent_competencies(&self, id: Uuid) -> Result<Vec<Competency>> {
    self.competency(id).await?;
    self.store.get_parent_competencies(id).await.map_err(Error::store)
  }

  /// `true` if `target` is reachable from `root` through sub-competency
  /// links.
  async fn is_descendant(&self, root: Uuid, target: Uuid) -> Result<bool> {
    let mut visited = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
      for child in self.store.find_children(id).await.map_err(Error::store)? {
        if child.competency_id == target {
          return Ok(true);
        }
        if visited.insert(child.competency_id) {
          queue.push_back(child.competency_id);
        }
      }
    }
    Ok(false)
  }
}
