//! Ingest path: chunk, append, rebuild, commit.
//!
//! Every ingest rebuilds the tenant's artifact from the full corpus:
//!
//! 1. Load the current corpus (metadata drift is repaired on load).
//! 2. Append the new chunk texts; ids continue the sequence.
//! 3. Represent every chunk with the configured backend (fresh fit).
//! 4. Commit through [`TenantStore::commit`]: the artifact, then the
//!    corpus, rolling the artifact back if the corpus write fails, then
//!    removing the other backend's artifact.
//!
//! Rebuilds of one tenant are serialized through its `rebuild` lock;
//! different tenants proceed in parallel. The commit holds the tenant's
//! `publish` lock for writing and runs as its own task, so a cancelled
//! ingest either commits fully or not at all before readers resume.

use std::sync::Arc;

use tracing::info;

use scholask_core::backend::SimilarityBackend;
use scholask_core::chunk::chunk_text;
use scholask_core::models::TenantCorpus;
use scholask_core::store::{LoadOutcome, TenantStore};
use scholask_core::tenant::validate_tenant;
use scholask_core::RagError;

use crate::locks::TenantLocks;

/// New chunk texts sharing one source URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceBatch {
    pub source_url: Option<String>,
    pub chunks: Vec<String>,
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// All chunk ids in the corpus after the rebuild, `0..N`.
    pub ids: Vec<usize>,
    /// Ids assigned by this call.
    pub added: Vec<usize>,
}

pub struct Indexer {
    store: Arc<dyn TenantStore>,
    backend: SimilarityBackend,
    max_chars: usize,
    locks: Arc<TenantLocks>,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn TenantStore>,
        backend: SimilarityBackend,
        max_chars: usize,
        locks: Arc<TenantLocks>,
    ) -> Self {
        Self {
            store,
            backend,
            max_chars,
            locks,
        }
    }

    /// Chunk `text` and ingest the result.
    ///
    /// Text that produces no chunks is [`RagError::EmptyContent`]; nothing
    /// is written.
    pub async fn ingest_text(
        &self,
        tenant: &str,
        text: &str,
        source_url: Option<&str>,
    ) -> Result<IngestReport, RagError> {
        let chunks = chunk_text(text, self.max_chars);
        if chunks.is_empty() {
            return Err(RagError::EmptyContent);
        }
        self.ingest(tenant, chunks, source_url).await
    }

    /// Append already-chunked texts and rebuild the tenant's index.
    pub async fn ingest(
        &self,
        tenant: &str,
        new_chunks: Vec<String>,
        source_url: Option<&str>,
    ) -> Result<IngestReport, RagError> {
        let batch = SourceBatch {
            source_url: source_url.map(str::to_string),
            chunks: new_chunks,
        };
        self.ingest_batches(tenant, vec![batch]).await
    }

    /// Append several batches in order and run a single rebuild.
    pub async fn ingest_batches(
        &self,
        tenant: &str,
        batches: Vec<SourceBatch>,
    ) -> Result<IngestReport, RagError> {
        validate_tenant(tenant)?;
        let handle = self.locks.handle(tenant);
        let _rebuild = handle.rebuild.lock().await;

        // Waits out a commit left running by a cancelled ingest.
        let loaded = {
            let _publish = handle.publish.read().await;
            self.store.load_corpus(tenant).await?
        };
        let mut corpus = match loaded {
            LoadOutcome::Found(corpus) => corpus,
            LoadOutcome::NotFound => TenantCorpus::new(tenant),
            LoadOutcome::Corrupt(reason) => {
                return Err(RagError::Corrupt {
                    tenant: tenant.to_string(),
                    reason,
                })
            }
        };

        let mut added = Vec::new();
        for batch in batches {
            added.extend(corpus.append(batch.chunks, batch.source_url.as_deref()));
        }
        let artifact = self.backend.represent(&corpus.texts()).await?;
        if artifact.rows() != corpus.len() {
            return Err(RagError::embedding(format!(
                "backend produced {} rows for {} chunks",
                artifact.rows(),
                corpus.len()
            )));
        }

        let total = corpus.len();
        let publish = handle.publish.clone().write_owned().await;
        let store = self.store.clone();
        let commit = tokio::spawn(async move {
            let _publish = publish;
            store.commit(&corpus, &artifact).await
        });
        commit
            .await
            .map_err(|e| RagError::persistence(tenant, format!("commit task failed: {}", e)))??;

        info!(
            tenant,
            chunks = total,
            added = added.len(),
            backend = self.backend.kind().as_str(),
            "index rebuilt"
        );
        Ok(IngestReport {
            ids: (0..total).collect(),
            added,
        })
    }
}
