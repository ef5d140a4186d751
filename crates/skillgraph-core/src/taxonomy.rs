//! Taxonomy nodes (competencies and skills) and the link rows that arrange
//! them into hierarchies.
//!
//! Both hierarchies are expressed through many-to-many link tables. The
//! single-parent fields on [`Competency`] and [`Skill`] are caches written when
//! a node is first placed; traversal always goes through the links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::name::normalize_name;

// ─── Competency ──────────────────────────────────────────────────────────────

/// Which pipeline first introduced a competency.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompetencySource {
  /// Created through a direct name lookup or administrative action.
  #[default]
  Manual,
  /// Created while persisting a generated topic hierarchy.
  Hierarchy,
  /// Created while extracting competencies from free text.
  Extraction,
  /// Created by on-demand generation.
  Generated,
}

/// A named capability area. Required skills are reached either through
/// directly linked skills or through sub-competencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competency {
  pub competency_id:    Uuid,
  /// Display name, as first given.
  pub name:             String,
  /// Unique lookup key; see [`normalize_name`].
  pub normalized_name:  String,
  pub description:      Option<String>,
  /// Deprecated single-parent pointer. Never read for traversal.
  pub legacy_parent_id: Option<Uuid>,
  pub source:           CompetencySource,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::TaxonomyStore::find_or_create_competency`].
#[derive(Debug, Clone)]
pub struct NewCompetency {
  pub name:        String,
  pub description: Option<String>,
  pub source:      CompetencySource,
}

impl NewCompetency {
  pub fn new(name: impl Into<String>, source: CompetencySource) -> Self {
    Self { name: name.into(), description: None, source }
  }

  pub fn normalized_name(&self) -> String { normalize_name(&self.name) }
}

// ─── Skill ───────────────────────────────────────────────────────────────────

/// A testable ability. A skill with no children in the skill hierarchy is a
/// most-granular skill (MGS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
  pub skill_id:        Uuid,
  pub name:            String,
  pub normalized_name: String,
  pub description:     Option<String>,
  /// Parent at creation time, if the skill was created inside a tree.
  pub parent_skill_id: Option<Uuid>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::TaxonomyStore::find_or_create_skill`].
#[derive(Debug, Clone)]
pub struct NewSkill {
  pub name:            String,
  pub description:     Option<String>,
  pub parent_skill_id: Option<Uuid>,
}

impl NewSkill {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), description: None, parent_skill_id: None }
  }

  pub fn under(mut self, parent_skill_id: Uuid) -> Self {
    self.parent_skill_id = Some(parent_skill_id);
    self
  }

  pub fn normalized_name(&self) -> String { normalize_name(&self.name) }
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// One edge of the N-ary competency hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencySubcompetencyLink {
  pub parent_id:  Uuid,
  pub child_id:   Uuid,
  pub created_at: DateTime<Utc>,
}

/// Whether a link-if-absent write inserted a row or found one already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
  Created,
  Existing,
}

impl LinkOutcome {
  pub fn from_inserted(inserted: bool) -> Self {
    if inserted { Self::Created } else { Self::Existing }
  }

  pub fn is_created(self) -> bool { matches!(self, Self::Created) }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn source_round_trips_through_strum() {
    for source in [
      CompetencySource::Manual,
      CompetencySource::Hierarchy,
      CompetencySource::Extraction,
      CompetencySource::Generated,
    ] {
      let text = source.to_string();
      assert_eq!(CompetencySource::from_str(&text).unwrap(), source);
    }
    assert_eq!(CompetencySource::Hierarchy.to_string(), "hierarchy");
  }

  #[test]
  fn new_skill_normalizes_its_name() {
    let parent = Uuid::new_v4();
    let skill = NewSkill::new("  Unit_Testing ").under(parent);
    assert_eq!(skill.normalized_name(), "unit testing");
    assert_eq!(skill.parent_skill_id, Some(parent));
  }
}
