//! Alias resolution: mapping free-text competency names onto existing
//! competencies before anything new is created.
//!
//! Strategies run in a fixed order and the first hit wins:
//!
//! 1. exact match on the normalised name,
//! 2. a registered alias,
//! 3. the compact form (separators removed) as a name or alias,
//! 4. a similarity scan over candidates that contain a fragment of the input
//!    or are themselves contained in it.
//!
//! A hit from step 3 or 4 registers the input's normalised form as an alias
//! so the next lookup is exact. With no hit the competency is created through
//! the store's find-or-create, which keeps concurrent resolutions of the same
//! new name down to one row.

use std::collections::HashSet;

use serde::Serialize;
use skillgraph_core::{
  name::{compact_name, normalize_name, search_fragments, similarity_score},
  port::{Notifier, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::{Competency, CompetencySource, NewCompetency},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result, Taxonomy};

/// How an existing competency was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
  Exact,
  Alias,
  Compact,
  Similar { score: u8 },
}

/// Result of [`Taxonomy::resolve_or_create_competency`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
  Found { competency: Competency, matched: MatchKind },
  Created { competency: Competency },
}

impl Resolution {
  pub fn competency(&self) -> &Competency {
    match self {
      Self::Found { competency, .. } | Self::Created { competency } => competency,
    }
  }

  pub fn into_competency(self) -> Competency {
    match self {
      Self::Found { competency, .. } | Self::Created { competency } => competency,
    }
  }

  pub fn is_created(&self) -> bool { matches!(self, Self::Created { .. }) }
}

/// A competency named either by id or by free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompetencyRef {
  Id(Uuid),
  Name(String),
}

impl From<Uuid> for CompetencyRef {
  fn from(id: Uuid) -> Self { Self::Id(id) }
}

impl From<&str> for CompetencyRef {
  fn from(name: &str) -> Self { Self::Name(name.to_owned()) }
}

impl From<String> for CompetencyRef {
  fn from(name: String) -> Self { Self::Name(name) }
}

impl<S, G, N> Taxonomy<S, G, N>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  /// Map `name` onto an existing competency, or create it.
  pub async fn resolve_or_create_competency(&self, name: &str) -> Result<Resolution> {
    self.resolve_with_source(name, CompetencySource::Manual).await
  }

  /// Look a competency up without creating anything or registering aliases.
  ///
  /// Names go through the exact, alias and compact strategies; the
  /// similarity scan is only part of [`Self::resolve_or_create_competency`].
  pub async fn find_competency(&self, target: impl Into<CompetencyRef>) -> Result<Competency> {
    match target.into() {
      CompetencyRef::Id(id) => self.competency(id).await,
      CompetencyRef::Name(name) => self
        .lookup(&name)
        .await?
        .map(|(competency, _)| competency)
        .ok_or_else(|| Error::NotFound(format!("competency {name:?}"))),
    }
  }

  pub async fn competency_aliases(&self, id: Uuid) -> Result<Vec<String>> {
    self.competency(id).await?;
    self.store.list_competency_aliases(id).await.map_err(Error::store)
  }

  pub(crate) async fn resolve_with_source(
    &self,
    name: &str,
    source: CompetencySource,
  ) -> Result<Resolution> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
      return Err(Error::Validation("competency name is empty".to_owned()));
    }

    if let Some((competency, matched)) = self.lookup(name).await? {
      if matched == MatchKind::Compact {
        self.register_alias(&competency, &normalized).await?;
      }
      return Ok(Resolution::Found { competency, matched });
    }

    if let Some((competency, score)) = self.most_similar(&normalized).await? {
      self.register_alias(&competency, &normalized).await?;
      return Ok(Resolution::Found { competency, matched: MatchKind::Similar { score } });
    }

    let (competency, created) = self
      .store
      .find_or_create_competency(NewCompetency::new(name.trim(), source))
      .await
      .map_err(Error::store)?;
    if created {
      info!(
        competency_id = %competency.competency_id,
        name = %competency.name,
        %source,
        "created competency"
      );
      Ok(Resolution::Created { competency })
    } else {
      // Another caller created it between the lookup and the insert.
      Ok(Resolution::Found { competency, matched: MatchKind::Exact })
    }
  }

  /// Strategies 1–3; read-only.
  async fn lookup(&self, name: &str) -> Result<Option<(Competency, MatchKind)>> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
      return Ok(None);
    }

    if let Some(c) = self.store.find_competency_by_name(&normalized).await.map_err(Error::store)? {
      return Ok(Some((c, MatchKind::Exact)));
    }
    if let Some(c) = self.store.find_competency_by_alias(&normalized).await.map_err(Error::store)? {
      return Ok(Some((c, MatchKind::Alias)));
    }

    let compact = compact_name(&normalized);
    if compact != normalized {
      if let Some(c) = self.store.find_competency_by_name(&compact).await.map_err(Error::store)? {
        return Ok(Some((c, MatchKind::Compact)));
      }
      if let Some(c) = self.store.find_competency_by_alias(&compact).await.map_err(Error::store)? {
        return Ok(Some((c, MatchKind::Compact)));
      }
    }

    Ok(None)
  }

  /// Strategy 4: the best-scoring candidate at or above the alias threshold.
  /// Candidates are names containing a fragment of the input, then names
  /// contained in the input. Ties keep the candidate retrieved first.
  async fn most_similar(&self, normalized: &str) -> Result<Option<(Competency, u8)>> {
    let limit = self.config.candidate_limit;
    let mut candidates = Vec::new();
    for fragment in search_fragments(normalized) {
      candidates.extend(
        self.store.find_competencies_like(&fragment, limit).await.map_err(Error::store)?,
      );
    }
    candidates.extend(
      self.store.find_competencies_within(normalized, limit).await.map_err(Error::store)?,
    );

    let mut seen = HashSet::new();
    let mut best: Option<(Competency, u8)> = None;
    for candidate in candidates {
      if !seen.insert(candidate.competency_id) {
        continue;
      }
      let score = similarity_score(normalized, &candidate.normalized_name);
      debug!(candidate = %candidate.name, score, "scored alias candidate");
      if score >= self.config.alias_threshold
        && best.as_ref().is_none_or(|(_, top)| score > *top)
      {
        best = Some((candidate, score));
      }
    }

    Ok(best)
  }

  async fn register_alias(&self, competency: &Competency, alias: &str) -> Result<()> {
    if alias == competency.normalized_name {
      return Ok(());
    }
    let added = self
      .store
      .add_competency_alias(competency.competency_id, alias)
      .await
      .map_err(Error::store)?;
    if added {
      info!(
        competency_id = %competency.competency_id,
        %alias,
        "registered competency alias"
      );
    }
    Ok(())
  }
}
