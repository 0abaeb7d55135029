//! In-memory [`TenantStore`] implementation for tests.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Each write replaces the
//! whole value, which gives the same all-or-nothing visibility as an
//! atomic rename. Corpus writes can be made to fail on demand to exercise
//! the rollback path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::backend::{BackendKind, IndexArtifact};
use crate::error::RagError;
use crate::models::TenantCorpus;

use super::{LoadOutcome, TenantStore};

#[derive(Default)]
pub struct InMemoryStore {
    corpora: RwLock<HashMap<String, TenantCorpus>>,
    artifacts: RwLock<HashMap<(String, BackendKind), IndexArtifact>>,
    fail_corpus_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write_corpus` fail with a persistence error.
    pub fn fail_corpus_writes(&self, fail: bool) {
        self.fail_corpus_writes.store(fail, Ordering::SeqCst);
    }

    pub fn has_artifact(&self, tenant: &str, kind: BackendKind) -> bool {
        self.artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(tenant.to_string(), kind))
    }
}

#[async_trait]
impl TenantStore for InMemoryStore {
    async fn load_corpus(&self, tenant: &str) -> Result<LoadOutcome<TenantCorpus>, RagError> {
        let corpora = self.corpora.read().unwrap_or_else(PoisonError::into_inner);
        Ok(match corpora.get(tenant) {
            Some(c) => LoadOutcome::Found(c.clone()),
            None => LoadOutcome::NotFound,
        })
    }

    async fn load_artifact(
        &self,
        tenant: &str,
        kind: BackendKind,
    ) -> Result<LoadOutcome<IndexArtifact>, RagError> {
        let artifacts = self.artifacts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(match artifacts.get(&(tenant.to_string(), kind)) {
            Some(a) => LoadOutcome::Found(a.clone()),
            None => LoadOutcome::NotFound,
        })
    }

    async fn write_artifact(&self, tenant: &str, artifact: &IndexArtifact) -> Result<(), RagError> {
        self.artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((tenant.to_string(), artifact.kind()), artifact.clone());
        Ok(())
    }

    async fn write_corpus(&self, corpus: &TenantCorpus) -> Result<(), RagError> {
        if self.fail_corpus_writes.load(Ordering::SeqCst) {
            return Err(RagError::persistence(
                PathBuf::from(format!("memory://{}/chunks", corpus.tenant)),
                "injected write failure",
            ));
        }
        self.corpora
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(corpus.tenant.clone(), corpus.clone());
        Ok(())
    }

    async fn remove_artifact(&self, tenant: &str, kind: BackendKind) -> Result<(), RagError> {
        self.artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(tenant.to_string(), kind));
        Ok(())
    }
}
