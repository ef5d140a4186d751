//! Ports to best-effort external collaborators: the tree generator and the
//! downstream notifier.
//!
//! Neither port participates in the consistency of the taxonomy. Callers log
//! and swallow their failures; nothing already committed is rolled back.

use std::{convert::Infallible, future::Future};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error,
  assessment::GapMode,
  tree::TreeNode,
  user::ProficiencyLevel,
};

// ─── Tree generator ──────────────────────────────────────────────────────────

/// Invents hierarchy and skill trees from a name. Output is untrusted and is
/// validated before anything is persisted.
pub trait TreeGenerator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// A competency hierarchy rooted at `topic`.
  fn generate_hierarchy<'a>(
    &'a self,
    topic: &'a str,
  ) -> impl Future<Output = Result<TreeNode, Self::Error>> + Send + 'a;

  /// A skill decomposition for the competency named `competency_name`.
  fn generate_skill_tree<'a>(
    &'a self,
    competency_name: &'a str,
  ) -> impl Future<Output = Result<TreeNode, Self::Error>> + Send + 'a;
}

/// A generator for deployments without one; every call fails with
/// [`Error::GeneratorUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

impl TreeGenerator for DisabledGenerator {
  type Error = Error;

  async fn generate_hierarchy(&self, _topic: &str) -> Result<TreeNode, Error> {
    Err(Error::GeneratorUnavailable)
  }

  async fn generate_skill_tree(&self, _competency_name: &str) -> Result<TreeNode, Error> {
    Err(Error::GeneratorUnavailable)
  }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Something other services may want to hear about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaxonomyEvent {
  CoverageUpdated {
    user_id:       Uuid,
    competency_id: Uuid,
    coverage:      f64,
    proficiency:   ProficiencyLevel,
  },
  GapAnalysisCompleted {
    user_id:       Uuid,
    mode:          GapMode,
    /// Names of competencies with at least one missing skill.
    competencies:  Vec<String>,
    missing_count: usize,
  },
}

/// Fire-and-forget delivery of [`TaxonomyEvent`]s.
pub trait Notifier: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    event: TaxonomyEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  type Error = Infallible;

  async fn notify(&self, _event: TaxonomyEvent) -> Result<(), Infallible> { Ok(()) }
}
