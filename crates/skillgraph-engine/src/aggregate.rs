//! Required most-granular skills (MGS) of a competency, and on-demand skill
//! tree generation for competencies that have none.
//!
//! Both hierarchies may contain cycles or shared nodes. Traversal is
//! iterative with an explicit visited set: a node already expanded is not
//! expanded again, and a node met again on its own path is logged as a cycle.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use skillgraph_core::{
  name::normalize_name,
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::{Competency, LinkOutcome, NewSkill, Skill},
  tree::{TreeAnomaly, TreeNode, flatten},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Error, Result, Taxonomy, resolver::CompetencyRef};

/// Counts from persisting one generated skill tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillTreeReport {
  /// `false` when the competency already had skills and nothing was written.
  pub persisted:       bool,
  pub skills_created:  usize,
  pub skills_existing: usize,
  pub links_created:   usize,
  pub links_existing:  usize,
  /// Sub-skill links refused because they would close a cycle.
  pub links_rejected:  usize,
  pub skipped:         Vec<TreeAnomaly>,
}

enum Visit<T> {
  Enter(T),
  Leave(Uuid),
}

impl<S, G, N> Taxonomy<S, G, N>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  /// The deduplicated MGS set of a competency, ordered by skill name.
  ///
  /// Leaf competencies without skills are populated through the tree
  /// generator first when `generate_missing_skills` is on; generator
  /// failures leave them empty.
  pub async fn required_mgs(&self, target: impl Into<CompetencyRef>) -> Result<Vec<Skill>> {
    let competency = self.find_competency(target).await?;
    let ids = self
      .required_mgs_ids(&competency, self.config.generate_missing_skills)
      .await?;
    self.hydrate_skills(ids).await
  }

  /// The leaves under a skill, or the skill itself if it is a leaf.
  pub async fn skill_mgs(&self, skill_id: Uuid) -> Result<Vec<Skill>> {
    self.skill(skill_id).await?;
    let mut visited = HashSet::new();
    let mut out = HashSet::new();
    self.collect_skill_mgs(skill_id, &mut visited, &mut out).await?;
    self.hydrate_skills(out).await
  }

  pub(crate) async fn required_mgs_ids(
    &self,
    root: &Competency,
    generate: bool,
  ) -> Result<HashSet<Uuid>> {
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut skills_visited = HashSet::new();
    let mut out = HashSet::new();
    let mut stack = vec![Visit::Enter(root.clone())];

    while let Some(step) = stack.pop() {
      let competency = match step {
        Visit::Leave(id) => {
          on_path.remove(&id);
          continue;
        }
        Visit::Enter(competency) => competency,
      };
      let id = competency.competency_id;
      if on_path.contains(&id) {
        warn!(
          competency_id = %id,
          root = %root.competency_id,
          "competency hierarchy contains a cycle"
        );
        continue;
      }
      if !visited.insert(id) {
        continue;
      }
      on_path.insert(id);
      stack.push(Visit::Leave(id));

      let children = self.store.find_children(id).await.map_err(Error::store)?;
      let mut skills = self.store.get_linked_skills(id).await.map_err(Error::store)?;
      if generate && children.is_empty() && skills.is_empty() {
        skills = self.generate_missing_skills(&competency).await?;
      }

      for skill in skills {
        self
          .collect_skill_mgs(skill.skill_id, &mut skills_visited, &mut out)
          .await?;
      }
      for child in children.into_iter().rev() {
        stack.push(Visit::Enter(child));
      }
    }

    debug!(competency_id = %root.competency_id, mgs = out.len(), "aggregated required MGS");
    Ok(out)
  }

  async fn collect_skill_mgs(
    &self,
    root: Uuid,
    visited: &mut HashSet<Uuid>,
    out: &mut HashSet<Uuid>,
  ) -> Result<()> {
    let mut on_path = HashSet::new();
    let mut stack = vec![Visit::Enter(root)];

    while let Some(step) = stack.pop() {
      let id = match step {
        Visit::Leave(id) => {
          on_path.remove(&id);
          continue;
        }
        Visit::Enter(id) => id,
      };
      if on_path.contains(&id) {
        warn!(skill_id = %id, root = %root, "skill hierarchy contains a cycle");
        continue;
      }
      if !visited.insert(id) {
        continue;
      }

      let children = self.store.get_subskills(id).await.map_err(Error::store)?;
      if children.is_empty() {
        out.insert(id);
        continue;
      }
      on_path.insert(id);
      stack.push(Visit::Leave(id));
      for child in children.into_iter().rev() {
        stack.push(Visit::Enter(child.skill_id));
      }
    }
    Ok(())
  }

  async fn hydrate_skills(&self, ids: impl IntoIterator<Item = Uuid>) -> Result<Vec<Skill>> {
    let ids: Vec<Uuid> = ids.into_iter().collect();
    self.store.get_skills(&ids).await.map_err(Error::store)
  }

  // ── Skill trees ──────────────────────────────────────────────────────

  /// Ask the generator for a skill tree for a competency and persist it.
  /// Does nothing if the competency already has skills.
  pub async fn generate_skill_tree(&self, competency_id: Uuid) -> Result<SkillTreeReport> {
    let competency = self.competency(competency_id).await?;
    self.populate_skill_tree(&competency).await
  }

  async fn generate_missing_skills(&self, competency: &Competency) -> Result<Vec<Skill>> {
    match self.populate_skill_tree(competency).await {
      Ok(_) => {}
      Err(e @ (Error::Generator(_) | Error::Validation(_))) => {
        warn!(
          competency_id = %competency.competency_id,
          name = %competency.name,
          error = %e,
          "skill generation failed; treating competency as having no skills"
        );
      }
      Err(e) => return Err(e),
    }
    self
      .store
      .get_linked_skills(competency.competency_id)
      .await
      .map_err(Error::store)
  }

  async fn populate_skill_tree(&self, competency: &Competency) -> Result<SkillTreeReport> {
    let id = competency.competency_id;
    if self.has_linked_skills(id).await? {
      return Ok(SkillTreeReport::default());
    }

    let tree = self
      .generator
      .generate_skill_tree(&competency.name)
      .await
      .map_err(Error::generator)?;

    // A concurrent generation for the same competency may be persisting too;
    // every write below is find-or-create, so both converge on one copy.
    self.merge_skill_tree(competency, &tree).await
  }

  async fn has_linked_skills(&self, id: Uuid) -> Result<bool> {
    let linked = self.store.get_linked_skills(id).await.map_err(Error::store)?;
    Ok(!linked.is_empty())
  }

  /// Persist `tree` as the skills of `competency`.
  ///
  /// A root named like the competency stands for the competency itself and
  /// its children become the top-level skills; any other root is a
  /// top-level skill. Skills are found-or-created by name, so a tree
  /// persisted twice converges on the same rows.
  pub async fn merge_skill_tree(
    &self,
    competency: &Competency,
    tree: &TreeNode,
  ) -> Result<SkillTreeReport> {
    let flat = flatten(tree);
    for anomaly in &flat.anomalies {
      warn!(
        competency_id = %competency.competency_id,
        parent = ?anomaly.parent,
        reason = %anomaly.reason,
        "dropping invalid subtree from generated skill tree"
      );
    }
    if flat.nodes.is_empty() {
      return Err(Error::Validation("generated skill tree has no valid root".to_owned()));
    }

    let root_is_competency = normalize_name(&flat.nodes[0].name) == competency.normalized_name;
    let mut report = SkillTreeReport { persisted: true, skipped: flat.anomalies, ..Default::default() };
    let mut ids: HashMap<String, Uuid> = HashMap::new();

    for (i, node) in flat.nodes.iter().enumerate() {
      if i == 0 && root_is_competency {
        continue;
      }
      let parent_id = node
        .parent
        .as_deref()
        .and_then(|p| ids.get(&normalize_name(p)).copied());

      let mut input = NewSkill::new(node.name.clone());
      if let Some(parent_id) = parent_id {
        input = input.under(parent_id);
      }
      let (skill, created) = self.store.find_or_create_skill(input).await.map_err(Error::store)?;
      if created {
        report.skills_created += 1;
      } else {
        report.skills_existing += 1;
      }
      ids.insert(skill.normalized_name.clone(), skill.skill_id);

      let outcome = match parent_id {
        None => self.link_skill(competency.competency_id, skill.skill_id).await,
        Some(parent_id) => self.link_subskill(parent_id, skill.skill_id).await,
      };
      match outcome {
        Ok(LinkOutcome::Created) => report.links_created += 1,
        Ok(LinkOutcome::Existing) => report.links_existing += 1,
        Err(Error::Validation(reason)) => {
          warn!(skill = %skill.name, %reason, "rejected generated skill link");
          report.links_rejected += 1;
        }
        Err(e) => return Err(e),
      }
    }

    info!(
      competency_id = %competency.competency_id,
      skills_created = report.skills_created,
      skills_existing = report.skills_existing,
      links_created = report.links_created,
      "persisted skill tree"
    );
    Ok(report)
  }

  // ── Skill links ──────────────────────────────────────────────────────

  /// Find or create a skill by name and link it directly to a competency.
  pub async fn add_skill(&self, competency_id: Uuid, name: &str) -> Result<Skill> {
    self.competency(competency_id).await?;
    let skill = self.find_or_create_skill(NewSkill::new(name.trim())).await?;
    self.link_skill(competency_id, skill.skill_id).await?;
    Ok(skill)
  }

  /// Find or create a skill by name and link it under `parent_skill_id`.
  pub async fn add_subskill(&self, parent_skill_id: Uuid, name: &str) -> Result<Skill> {
    self.skill(parent_skill_id).await?;
    let skill = self
      .find_or_create_skill(NewSkill::new(name.trim()).under(parent_skill_id))
      .await?;
    self.link_subskill(parent_skill_id, skill.skill_id).await?;
    Ok(skill)
  }

  async fn find_or_create_skill(&self, input: NewSkill) -> Result<Skill> {
    if input.normalized_name().is_empty() {
      return Err(Error::Validation("skill name is empty".to_owned()));
    }
    let (skill, created) = self.store.find_or_create_skill(input).await.map_err(Error::store)?;
    if created {
      info!(skill_id = %skill.skill_id, name = %skill.name, "created skill");
    }
    Ok(skill)
  }

  pub async fn link_skill(&self, competency_id: Uuid, skill_id: Uuid) -> Result<LinkOutcome> {
    self
      .store
      .link_skill(competency_id, skill_id)
      .await
      .map_err(Error::store)
  }

  pub async fn unlink_skill(&self, competency_id: Uuid, skill_id: Uuid) -> Result<bool> {
    self
      .store
      .unlink_skill(competency_id, skill_id)
      .await
      .map_err(Error::store)
  }

  pub async fn linked_skills(&self, competency_id: Uuid) -> Result<Vec<Skill>> {
    self.competency(competency_id).await?;
    self
      .store
      .get_linked_skills(competency_id)
      .await
      .map_err(Error::store)
  }

  pub async fn subskills(&self, skill_id: Uuid) -> Result<Vec<Skill>> {
    self.skill(skill_id).await?;
    self.store.get_subskills(skill_id).await.map_err(Error::store)
  }

  /// Link `child` under `parent` in the skill hierarchy, refusing self-links
  /// and links that would make a skill its own ancestor.
  pub async fn link_subskill(&self, parent: Uuid, child: Uuid) -> Result<LinkOutcome> {
    if parent == child {
      return Err(Error::Validation(format!("skill {parent} cannot be its own sub-skill")));
    }
    if self.is_skill_ancestor(child, parent).await? {
      return Err(Error::Validation(format!(
        "linking skill {child} under {parent} would create a cycle"
      )));
    }
    self
      .store
      .link_subskill(parent, child)
      .await
      .map_err(Error::store)
  }

  /// `true` if `ancestor` is reachable from `skill` through parent links.
  async fn is_skill_ancestor(&self, ancestor: Uuid, skill: Uuid) -> Result<bool> {
    let mut visited = HashSet::from([skill]);
    let mut queue = VecDeque::from([skill]);
    while let Some(id) = queue.pop_front() {
      for parent in self.store.find_skill_parents(id).await.map_err(Error::store)? {
        if parent.skill_id == ancestor {
          return Ok(true);
        }
        if visited.insert(parent.skill_id) {
          queue.push_back(parent.skill_id);
        }
      }
    }
    Ok(false)
  }
}
