//! Gap analysis vocabulary and the assessment policy that selects between
//! broad and narrow analysis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Which kind of exam produced a batch of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssessmentKind {
  Baseline,
  FollowUp,
}

/// Scope of a gap analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GapMode {
  /// Every competency on the user's career path.
  Broad,
  /// An explicit set of competencies.
  Narrow,
}

impl GapMode {
  /// A baseline or a passed follow-up looks at the whole career path; a
  /// failed follow-up stays on the competencies it touched.
  pub fn for_assessment(kind: AssessmentKind, passed: bool) -> Self {
    match (kind, passed) {
      (AssessmentKind::FollowUp, false) => Self::Narrow,
      _ => Self::Broad,
    }
  }
}

/// One required skill the user has not verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSkill {
  pub skill_id:   Uuid,
  pub skill_name: String,
}

/// Competency display name → missing skills, ordered by skill name.
pub type GapReport = BTreeMap<String, Vec<MissingSkill>>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mode_selection_policy() {
    assert_eq!(GapMode::for_assessment(AssessmentKind::Baseline, true), GapMode::Broad);
    assert_eq!(GapMode::for_assessment(AssessmentKind::Baseline, false), GapMode::Broad);
    assert_eq!(GapMode::for_assessment(AssessmentKind::FollowUp, true), GapMode::Broad);
    assert_eq!(GapMode::for_assessment(AssessmentKind::FollowUp, false), GapMode::Narrow);
  }
}
