//! The [`Taxonomy`] service and the helpers shared by its operation modules.

use std::sync::Arc;

use skillgraph_core::{
  port::{DisabledGenerator, NoopNotifier, Notifier, TaxonomyEvent, TreeGenerator},
  store::TaxonomyStore,
  taxonomy::{Competency, Skill},
};
use tracing::warn;
use uuid::Uuid;

use crate::{Error, Result, TaxonomyConfig};

/// The taxonomy engine.
///
/// Cheap to clone; all collaborators sit behind [`Arc`]s.
pub struct Taxonomy<S, G = DisabledGenerator, N = NoopNotifier> {
  pub(crate) store:     Arc<S>,
  pub(crate) generator: Arc<G>,
  pub(crate) notifier:  Arc<N>,
  pub(crate) config:    TaxonomyConfig,
}

impl<S, G, N> Clone for Taxonomy<S, G, N> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      generator: Arc::clone(&self.generator),
      notifier:  Arc::clone(&self.notifier),
      config:    self.config.clone(),
    }
  }
}

impl<S: TaxonomyStore> Taxonomy<S> {
  /// An engine without a tree generator or notifier.
  pub fn with_store(store: S, config: TaxonomyConfig) -> Self {
    Self::new(
      Arc::new(store),
      Arc::new(DisabledGenerator),
      Arc::new(NoopNotifier),
      config,
    )
  }
}

impl<S, G, N> Taxonomy<S, G, N>
where
  S: TaxonomyStore,
  G: TreeGenerator,
  N: Notifier,
{
  pub fn new(store: Arc<S>, generator: Arc<G>, notifier: Arc<N>, config: TaxonomyConfig) -> Self {
    Self { store, generator, notifier, config }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &TaxonomyConfig { &self.config }

  /// Fetch a competency by id, or fail with [`Error::NotFound`].
  pub async fn competency(&self, id: Uuid) -> Result<Competency> {
    self
      .store
      .get_competency(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("competency {id}")))
  }

  pub async fn list_competencies(&self) -> Result<Vec<Competency>> {
    self.store.list_competencies().await.map_err(Error::store)
  }

  /// Fetch a skill by id, or fail with [`Error::NotFound`].
  pub async fn skill(&self, id: Uuid) -> Result<Skill> {
    self
      .store
      .get_skill(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("skill {id}")))
  }

  /// Delete a competency together with its links, aliases, user rows and
  /// career-path entries.
  pub async fn delete_competency(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_competency(id).await.map_err(Error::store)? {
      return Err(Error::NotFound(format!("competency {id}")));
    }
    tracing::info!(competency_id = %id, "deleted competency");
    Ok(())
  }

  /// Deliver `event` on a background task. Failures are logged and dropped.
  pub(crate) fn notify(&self, event: TaxonomyEvent) {
    let notifier = Arc::clone(&self.notifier);
    tokio::spawn(async move {
      if let Err(e) = notifier.notify(event).await {
        warn!(error = %e, "failed to deliver taxonomy event");
      }
    });
  }
}
