//! Tuning knobs for the engine.

use serde::{Deserialize, Serialize};

/// Engine configuration. Every field has a default, so an empty table
/// deserialises to [`TaxonomyConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
  /// Minimum similarity score (0–100) at which a free-text name is treated
  /// as an alias of an existing competency.
  pub alias_threshold:         u8,
  /// Maximum candidates fetched per search fragment during the similarity
  /// scan.
  pub candidate_limit:         usize,
  /// Ask the tree generator for a skill tree when aggregation reaches a
  /// competency with neither sub-competencies nor skills.
  pub generate_missing_skills: bool,
}

impl Default for TaxonomyConfig {
  fn default() -> Self {
    Self {
      alias_threshold:         80,
      candidate_limit:         50,
      generate_missing_skills: true,
    }
  }
}
