//! Storage abstraction for tenant corpora and their index artifacts.
//!
//! The [`TenantStore`] trait is the persistence seam of the rebuild
//! protocol: the indexer reads current state, then hands the new
//! generation to [`TenantStore::commit`], which writes the artifact, then
//! the corpus, and removes the artifact again if the corpus write fails.
//! Implementations must publish each write atomically; a reader sees
//! either the previous file or the new one, never a mix.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::backend::{BackendKind, IndexArtifact};
use crate::error::RagError;
use crate::models::TenantCorpus;

/// Result of reading persisted state that may legitimately be absent.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Found(T),
    /// Nothing has been written for this tenant yet.
    NotFound,
    /// A file exists but cannot be decoded.
    Corrupt(String),
}

impl<T> LoadOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            LoadOutcome::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// Abstract per-tenant persistence.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load_corpus`](TenantStore::load_corpus) | Chunk texts + metadata, repairing metadata drift |
/// | [`load_artifact`](TenantStore::load_artifact) | The artifact of one backend kind |
/// | [`write_artifact`](TenantStore::write_artifact) | Atomically publish an artifact |
/// | [`write_corpus`](TenantStore::write_corpus) | Atomically publish chunk texts + metadata |
/// | [`remove_artifact`](TenantStore::remove_artifact) | Delete an artifact; absent is fine |
/// | [`commit`](TenantStore::commit) | Publish a rebuilt generation with rollback |
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Load a tenant's corpus.
    ///
    /// A metadata record count that differs from the chunk count is
    /// repaired in the returned value (see [`TenantCorpus::from_parts`]),
    /// not reported as corruption.
    async fn load_corpus(&self, tenant: &str) -> Result<LoadOutcome<TenantCorpus>, RagError>;

    async fn load_artifact(
        &self,
        tenant: &str,
        kind: BackendKind,
    ) -> Result<LoadOutcome<IndexArtifact>, RagError>;

    async fn write_artifact(&self, tenant: &str, artifact: &IndexArtifact)
        -> Result<(), RagError>;

    async fn write_corpus(&self, corpus: &TenantCorpus) -> Result<(), RagError>;

    async fn remove_artifact(&self, tenant: &str, kind: BackendKind) -> Result<(), RagError>;

    /// Publish a rebuilt generation: the artifact first, then the corpus.
    ///
    /// If the corpus write fails the artifact just written is removed and
    /// the corpus error is returned. On success the artifact of the other
    /// backend kind, if any, is removed.
    async fn commit(
        &self,
        corpus: &TenantCorpus,
        artifact: &IndexArtifact,
    ) -> Result<(), RagError> {
        let tenant = corpus.tenant.as_str();
        self.write_artifact(tenant, artifact).await?;

        if let Err(e) = self.write_corpus(corpus).await {
            error!(tenant, error = %e, "corpus write failed, rolling back index artifact");
            if let Err(rollback) = self.remove_artifact(tenant, artifact.kind()).await {
                error!(tenant, error = %rollback, "artifact rollback failed");
            }
            return Err(e);
        }

        let stale = artifact.kind().other();
        if let Err(e) = self.remove_artifact(tenant, stale).await {
            warn!(tenant, kind = stale.as_str(), error = %e, "could not remove stale artifact");
        }
        Ok(())
    }
}
