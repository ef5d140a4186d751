//! Error type for `skillgraph-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A competency or skill looked up by id or name does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// Malformed input: an invalid generated tree, an empty name, or a link
  /// that would break the hierarchy invariants.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("tree generator error: {0}")]
  Generator(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn generator(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Generator(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
