//! Taxonomy engine: hierarchy building, MGS aggregation, coverage
//! propagation, gap analysis and alias resolution.
//!
//! Everything hangs off [`Taxonomy`], which is generic over the
//! [`TaxonomyStore`](skillgraph_core::store::TaxonomyStore) backend and the two
//! best-effort ports ([`TreeGenerator`](skillgraph_core::port::TreeGenerator),
//! [`Notifier`](skillgraph_core::port::Notifier)). Each concern lives in its own
//! module as a separate `impl` block:
//!
//! | Module | Operations |
//! |--------|------------|
//! | [`resolver`] | `resolve_or_create_competency`, `find_competency` |
//! | [`hierarchy`] | `build_hierarchy`, `link_subcompetency`, `unlink_subcompetency` |
//! | [`aggregate`] | `required_mgs`, `skill_mgs`, `generate_skill_tree` |
//! | [`coverage`] | `upsert_user_competency_evidence` and upward propagation |
//! | [`gap`] | `compute_gap`, `record_assessment`, career-path management |

pub mod aggregate;
pub mod config;
pub mod coverage;
pub mod error;
pub mod gap;
pub mod hierarchy;
pub mod resolver;
mod service;

pub use config::TaxonomyConfig;
pub use error::{Error, Result};
pub use service::Taxonomy;
