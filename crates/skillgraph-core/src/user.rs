//! Per-user competency ledger: coverage, proficiency and verified evidence.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

// ─── Proficiency ─────────────────────────────────────────────────────────────

/// A discrete band derived from coverage.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProficiencyLevel {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

impl ProficiencyLevel {
  /// Band lower bounds: 80 expert, 60 advanced, 40 intermediate.
  pub fn from_coverage(coverage: f64) -> Self {
    if coverage >= 80.0 {
      Self::Expert
    } else if coverage >= 60.0 {
      Self::Advanced
    } else if coverage >= 40.0 {
      Self::Intermediate
    } else {
      Self::Beginner
    }
  }
}

/// `verified / required` as a percentage rounded to two decimals; zero when
/// nothing is required.
pub fn coverage_percent(verified: usize, required: usize) -> f64 {
  if required == 0 {
    return 0.0;
  }
  let ratio = verified.min(required) as f64 / required as f64;
  (ratio * 10_000.0).round() / 100.0
}

// ─── Evidence ────────────────────────────────────────────────────────────────

/// One entry of a user's evidence list. Must reference a most-granular skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEvidence {
  pub skill_id:   Uuid,
  pub skill_name: String,
  pub verified:   bool,
  #[serde(default)]
  pub score:      Option<f64>,
}

impl SkillEvidence {
  pub fn verified(skill_id: Uuid, skill_name: impl Into<String>) -> Self {
    Self { skill_id, skill_name: skill_name.into(), verified: true, score: None }
  }
}

// ─── UserCompetency ──────────────────────────────────────────────────────────

/// A user's standing against one competency.
///
/// `required_mgs_count` and `verified_mgs_count` are the values this row
/// contributes to its parents when coverage is propagated upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCompetency {
  pub user_id:            Uuid,
  pub competency_id:      Uuid,
  /// Percentage in `0.0..=100.0`, two decimals.
  pub coverage:           f64,
  pub proficiency:        ProficiencyLevel,
  pub required_mgs_count: u32,
  pub verified_mgs_count: u32,
  pub verified_skills:    Vec<SkillEvidence>,
  pub updated_at:         DateTime<Utc>,
}

impl UserCompetency {
  /// A fresh row with zero coverage and no evidence.
  pub fn new(user_id: Uuid, competency_id: Uuid) -> Self {
    Self {
      user_id,
      competency_id,
      coverage: 0.0,
      proficiency: ProficiencyLevel::default(),
      required_mgs_count: 0,
      verified_mgs_count: 0,
      verified_skills: Vec::new(),
      updated_at: Utc::now(),
    }
  }

  /// Merge incoming evidence into the list. An incoming entry replaces any
  /// existing entry for the same skill; new skills are appended in order.
  pub fn merge_evidence(&mut self, incoming: impl IntoIterator<Item = SkillEvidence>) {
    for entry in incoming {
      match self
        .verified_skills
        .iter_mut()
        .find(|e| e.skill_id == entry.skill_id)
      {
        Some(existing) => *existing = entry,
        None => self.verified_skills.push(entry),
      }
    }
  }

  /// Skill ids with `verified == true`.
  pub fn verified_skill_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
    self
      .verified_skills
      .iter()
      .filter(|e| e.verified)
      .map(|e| e.skill_id)
  }

  /// Number of verified entries whose skill is in `required`.
  pub fn count_verified_in(&self, required: &HashSet<Uuid>) -> usize {
    self
      .verified_skill_ids()
      .collect::<HashSet<_>>()
      .intersection(required)
      .count()
  }

  /// Record new counts and recompute coverage and proficiency from them.
  pub fn apply_counts(&mut self, required: usize, verified: usize) {
    self.required_mgs_count = u32::try_from(required).unwrap_or(u32::MAX);
    self.verified_mgs_count = u32::try_from(verified).unwrap_or(u32::MAX);
    self.coverage = coverage_percent(verified, required);
    self.proficiency = ProficiencyLevel::from_coverage(self.coverage);
    self.updated_at = Utc::now();
  }
}

// ─── Career path ─────────────────────────────────────────────────────────────

/// A competency the user has declared as a learning target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPathEntry {
  pub user_id:       Uuid,
  pub competency_id: Uuid,
  pub created_at:    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn proficiency_band_boundaries() {
    let cases = [
      (0.0, ProficiencyLevel::Beginner),
      (39.0, ProficiencyLevel::Beginner),
      (39.99, ProficiencyLevel::Beginner),
      (40.0, ProficiencyLevel::Intermediate),
      (59.0, ProficiencyLevel::Intermediate),
      (60.0, ProficiencyLevel::Advanced),
      (79.0, ProficiencyLevel::Advanced),
      (80.0, ProficiencyLevel::Expert),
      (100.0, ProficiencyLevel::Expert),
    ];
    for (coverage, expected) in cases {
      assert_eq!(ProficiencyLevel::from_coverage(coverage), expected, "{coverage}");
    }
  }

  #[test]
  fn proficiency_serialises_upper_case() {
    let json = serde_json::to_string(&ProficiencyLevel::Intermediate).unwrap();
    assert_eq!(json, "\"INTERMEDIATE\"");
    assert_eq!(ProficiencyLevel::Expert.to_string(), "EXPERT");
  }

  #[test]
  fn coverage_rounds_to_two_decimals() {
    assert_eq!(coverage_percent(1, 3), 33.33);
    assert_eq!(coverage_percent(2, 3), 66.67);
    assert_eq!(coverage_percent(3, 3), 100.0);
    assert_eq!(coverage_percent(0, 0), 0.0);
    assert_eq!(coverage_percent(5, 0), 0.0);
  }

  #[test]
  fn merge_replaces_same_skill_and_appends_new() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut uc = UserCompetency::new(Uuid::new_v4(), Uuid::new_v4());
    uc.merge_evidence([SkillEvidence {
      skill_id:   a,
      skill_name: "a".into(),
      verified:   false,
      score:      Some(20.0),
    }]);
    uc.merge_evidence([SkillEvidence::verified(a, "a"), SkillEvidence::verified(b, "b")]);

    assert_eq!(uc.verified_skills.len(), 2);
    assert!(uc.verified_skills.iter().all(|e| e.verified));
    assert_eq!(uc.verified_skill_ids().collect::<Vec<_>>(), vec![a, b]);
  }

  #[test]
  fn count_verified_ignores_skills_outside_required_set() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut uc = UserCompetency::new(Uuid::new_v4(), Uuid::new_v4());
    uc.merge_evidence([SkillEvidence::verified(a, "a"), SkillEvidence::verified(b, "b")]);

    let required: HashSet<Uuid> = [a, Uuid::new_v4()].into_iter().collect();
    assert_eq!(uc.count_verified_in(&required), 1);

    uc.apply_counts(required.len(), 1);
    assert_eq!(uc.coverage, 50.0);
    assert_eq!(uc.proficiency, ProficiencyLevel::Intermediate);
  }
}
