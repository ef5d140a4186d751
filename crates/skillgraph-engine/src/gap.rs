//! Gap analysis over a user's career path, the assessment policy that picks
//! broad or narrow analysis, and career-path management.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use skillgraph_core::{
  assessment::{AssessmentKind, GapMode, GapReport, MissingSkill},
  port::{Notifier, TaxonomyEvent, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::Competency,
  user::SkillEvidence,
};
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result, Taxonomy, coverage::CoverageResult, resolver::CompetencyRef};

/// Which competencies a gap analysis looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapScope {
  /// The user's whole career path.
  Broad,
  /// An explicit set of competencies.
  Narrow(Vec<Uuid>),
}

impl GapScope {
  pub fn mode(&self) -> GapMode {
    match self {
      Self::Broad => GapMode::Broad,
      Self::Narrow(_) => GapMode::Narrow,
    }
  }
}

/// Results of one exam, grouped by competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
  pub kind:    AssessmentKind,
  pub passed:  bool,
  #[serde(default)]
  pub results: Vec<CompetencyEvidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyEvidence {
  pub competency_id: Uuid,
  pub evidence:      Vec<SkillEvidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentOutcome {
  pub mode:     GapMode,
  pub coverage: Vec<CoverageResult>,
  pub gaps:     GapReport,
}

impl<S, G, N> Taxonomy<S, G, N>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  /// Required MGS the user has not verified, keyed by competency name.
  /// Competencies with nothing missing are left out.
  pub async fn compute_gap(&self, user_id: Uuid, scope: &GapScope) -> Result<GapReport> {
    let targets = match scope {
      GapScope::Broad => self
        .store
        .list_career_path(user_id)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|entry| entry.competency_id)
        .collect(),
      GapScope::Narrow(ids) => ids.clone(),
    };

    let mut report = GapReport::new();
    if targets.is_empty() {
      return Ok(report);
    }

    let verified = self.user_verified_skills(user_id).await?;
    let mut seen = HashSet::new();
    for id in targets {
      if !seen.insert(id) {
        continue;
      }
      let competency = self.competency(id).await?;
      let required = self
        .required_mgs_ids(&competency, self.config.generate_missing_skills)
        .await?;
      let missing: Vec<Uuid> = required.difference(&verified).copied().collect();
      if missing.is_empty() {
        continue;
      }
      let skills = self.store.get_skills(&missing).await.map_err(Error::store)?;
      report.insert(
        competency.name,
        skills
          .into_iter()
          .map(|s| MissingSkill { skill_id: s.skill_id, skill_name: s.name })
          .collect(),
      );
    }
    Ok(report)
  }

  /// Record an exam's evidence, then run the gap analysis its outcome calls
  /// for: a failed follow-up narrows to the competencies it assessed,
  /// anything else looks at the whole career path.
  pub async fn record_assessment(
    &self,
    user_id: Uuid,
    assessment: Assessment,
  ) -> Result<AssessmentOutcome> {
    let mode = GapMode::for_assessment(assessment.kind, assessment.passed);
    let mut coverage = Vec::with_capacity(assessment.results.len());
    let mut assessed = Vec::with_capacity(assessment.results.len());
    for result in assessment.results {
      assessed.push(result.competency_id);
      coverage.push(
        self
          .upsert_user_competency_evidence(user_id, result.competency_id, result.evidence)
          .await?,
      );
    }

    let scope = match mode {
      GapMode::Broad => GapScope::Broad,
      GapMode::Narrow => GapScope::Narrow(assessed),
    };
    let gaps = self.compute_gap(user_id, &scope).await?;
    let missing_count = gaps.values().map(Vec::len).sum();

    info!(
      %user_id,
      kind = %assessment.kind,
      passed = assessment.passed,
      %mode,
      gap_competencies = gaps.len(),
      missing_count,
      "recorded assessment"
    );
    self.notify(TaxonomyEvent::GapAnalysisCompleted {
      user_id,
      mode,
      competencies: gaps.keys().cloned().collect(),
      missing_count,
    });

    Ok(AssessmentOutcome { mode, coverage, gaps })
  }

  // ── Career path ──────────────────────────────────────────────────────

  /// Add a competency to the user's career path. A name goes through
  /// [`Self::resolve_or_create_competency`].
  pub async fn add_career_path(
    &self,
    user_id: Uuid,
    target: impl Into<CompetencyRef>,
  ) -> Result<Competency> {
    let competency = match target.into() {
      CompetencyRef::Id(id) => self.competency(id).await?,
      CompetencyRef::Name(name) => self.resolve_or_create_competency(&name).await?.into_competency(),
    };
    let added = self
      .store
      .add_career_path(user_id, competency.competency_id)
      .await
      .map_err(Error::store)?;
    if added {
      info!(%user_id, competency_id = %competency.competency_id, "added career path entry");
    }
    Ok(competency)
  }

  /// Returns `false` if the competency was not on the path.
  pub async fn remove_career_path(&self, user_id: Uuid, competency_id: Uuid) -> Result<bool> {
    self
      .store
      .remove_career_path(user_id, competency_id)
      .await
      .map_err(Error::store)
  }

  /// The user's career-path competencies in the order they were added.
  pub async fn career_path(&self, user_id: Uuid) -> Result<Vec<Competency>> {
    let entries = self
      .store
      .list_career_path(user_id)
      .await
      .map_err(Error::store)?;
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
      out.push(self.competency(entry.competency_id).await?);
    }
    Ok(out)
  }
}
