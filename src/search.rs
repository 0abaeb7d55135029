//! Query path: load a tenant's snapshot, score, rank, join.
//!
//! A snapshot is the corpus plus the current mode's artifact. The two are
//! published by separate renames; loads hold the tenant's `publish` lock
//! for reading, so an in-process commit is waited out rather than observed
//! halfway. A mismatch can still come from another process writing the
//! same directory, so the load is retried a few times before the tenant is
//! reported unavailable.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use scholask_core::backend::{IndexArtifact, SimilarityBackend};
use scholask_core::models::{meta_for, RetrievedPassage, SearchHit, TenantCorpus};
use scholask_core::search::rank;
use scholask_core::store::{LoadOutcome, TenantStore};
use scholask_core::tenant::validate_tenant;
use scholask_core::RagError;

use crate::locks::TenantLocks;

const LOAD_ATTEMPTS: usize = 3;
const LOAD_RETRY_DELAY: Duration = Duration::from_millis(25);

/// A consistent view of one tenant: `artifact.rows() == corpus.len()`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub corpus: TenantCorpus,
    pub artifact: IndexArtifact,
}

pub struct Searcher {
    store: Arc<dyn TenantStore>,
    backend: SimilarityBackend,
    preview_chars: usize,
    locks: Arc<TenantLocks>,
}

impl Searcher {
    pub fn new(
        store: Arc<dyn TenantStore>,
        backend: SimilarityBackend,
        preview_chars: usize,
        locks: Arc<TenantLocks>,
    ) -> Self {
        Self {
            store,
            backend,
            preview_chars,
            locks,
        }
    }

    /// Load the tenant's corpus and artifact together.
    ///
    /// `NotFound` when the tenant has never been indexed. A snapshot whose
    /// counts still disagree after retrying, or whose files are unreadable,
    /// is `Corrupt`.
    pub async fn load(&self, tenant: &str) -> Result<LoadOutcome<Snapshot>, RagError> {
        validate_tenant(tenant)?;
        let kind = self.backend.kind();
        let handle = self.locks.handle(tenant);
        let mut last_reason = String::new();

        for attempt in 0..LOAD_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(LOAD_RETRY_DELAY).await;
            }

            let (corpus, artifact) = {
                let _publish = handle.publish.read().await;
                let corpus = self.store.load_corpus(tenant).await?;
                let artifact = self.store.load_artifact(tenant, kind).await?;
                (corpus, artifact)
            };
            match (corpus, artifact) {
                (LoadOutcome::NotFound, LoadOutcome::NotFound) => return Ok(LoadOutcome::NotFound),
                (LoadOutcome::Corrupt(reason), _) | (_, LoadOutcome::Corrupt(reason)) => {
                    return Ok(LoadOutcome::Corrupt(reason))
                }
                (LoadOutcome::Found(corpus), LoadOutcome::Found(artifact))
                    if artifact.rows() == corpus.len() =>
                {
                    return Ok(LoadOutcome::Found(Snapshot { corpus, artifact }));
                }
                (corpus, artifact) => {
                    last_reason = format!(
                        "{} chunks vs {} {} rows",
                        count(&corpus, |c| c.len()),
                        count(&artifact, |a| a.rows()),
                        kind.as_str()
                    );
                    debug!(
                        tenant,
                        attempt,
                        reason = %last_reason,
                        "inconsistent snapshot, retrying"
                    );
                }
            }
        }

        Ok(LoadOutcome::Corrupt(last_reason))
    }

    /// Top `min(k, chunks)` hits for `query`, best first, ties by lower id.
    ///
    /// A tenant without a usable index is [`RagError::SearchUnavailable`],
    /// even for a blank query; otherwise a blank query yields no hits.
    pub async fn search(
        &self,
        tenant: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, RagError> {
        Ok(self
            .retrieve(tenant, query, k)
            .await?
            .into_iter()
            .map(|p| p.hit)
            .collect())
    }

    /// Like [`search`](Self::search), joined with chunk text and metadata.
    pub async fn retrieve(
        &self,
        tenant: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, RagError> {
        let snapshot = match self.load(tenant).await? {
            LoadOutcome::Found(s) => s,
            LoadOutcome::NotFound => {
                warn!(tenant, "no index for tenant");
                return Err(RagError::unavailable(tenant, "no index has been built"));
            }
            LoadOutcome::Corrupt(reason) => {
                warn!(tenant, %reason, "index unusable");
                return Err(RagError::unavailable(tenant, reason));
            }
        };
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let repr = self.backend.represent_query(query, &snapshot.artifact).await?;
        let scores = SimilarityBackend::score(&repr, &snapshot.artifact)?;
        let hits = rank(&scores, k);

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                snapshot.corpus.get(hit.chunk_id).map(|chunk| RetrievedPassage {
                    hit,
                    text: chunk.text.clone(),
                    meta: meta_for(chunk, self.preview_chars),
                })
            })
            .collect())
    }
}

fn count<T>(outcome: &LoadOutcome<T>, len: impl Fn(&T) -> usize) -> String {
    match outcome {
        LoadOutcome::Found(v) => len(v).to_string(),
        LoadOutcome::NotFound => "missing".to_string(),
        LoadOutcome::Corrupt(_) => "corrupt".to_string(),
    }
}
