//! Error types for `skillgraph-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("tree node under {parent:?} has no name")]
  MissingNodeName { parent: Option<String> },

  #[error("core node {0:?} must not carry children")]
  CoreNodeWithChildren(String),

  #[error("unknown proficiency level: {0:?}")]
  UnknownProficiency(String),

  #[error("unknown competency source: {0:?}")]
  UnknownSource(String),

  #[error("tree generator is not configured")]
  GeneratorUnavailable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
