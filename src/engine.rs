//! Wiring: configuration → store, backend, indexer, searcher, answers.

use std::sync::Arc;

use anyhow::{bail, Result};
use serde::Serialize;

use scholask_core::backend::{BackendKind, SimilarityBackend};
use scholask_core::embedding::EmbeddingProvider;
use scholask_core::generation::GenerationProvider;
use scholask_core::store::{LoadOutcome, TenantStore};
use scholask_core::tenant::validate_tenant;
use scholask_core::RagError;

use crate::answer::AnswerPipeline;
use crate::config::{AnswerMode, Config, IndexMode};
use crate::embedding::create_provider;
use crate::fs_store::FsTenantStore;
use crate::generation::create_generator;
use crate::indexer::Indexer;
use crate::locks::TenantLocks;
use crate::search::Searcher;

#[derive(Debug, Clone, Serialize)]
pub struct TenantStatus {
    pub tenant: String,
    /// `None` when no corpus file exists or it is unreadable.
    pub chunks: Option<usize>,
    pub backend: BackendKind,
    /// Rows in the current mode's artifact, `None` when absent or unreadable.
    pub rows: Option<usize>,
}

pub struct Engine {
    config: Config,
    store: Arc<dyn TenantStore>,
    indexer: Indexer,
    searcher: Arc<Searcher>,
    pipeline: AnswerPipeline,
}

impl Engine {
    /// Build the filesystem-backed engine with the configured providers.
    ///
    /// Providers that the mode does not use are never constructed, so an
    /// offline engine needs no API key.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn TenantStore> = Arc::new(FsTenantStore::new(
            config.index.dir.clone(),
            config.retrieval.preview_chars,
        ));
        let embedder = match config.index.mode {
            IndexMode::Online => Some(create_provider(&config.embedding)?),
            IndexMode::Offline => None,
        };
        let generator = match config.answer_mode() {
            AnswerMode::Generate => create_generator(&config.generation)?,
            AnswerMode::Extract => None,
        };
        Self::with_parts(config, store, embedder, generator)
    }

    /// Build an engine from explicit parts. Used by tests and embedders.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn TenantStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        generator: Option<Arc<dyn GenerationProvider>>,
    ) -> Result<Self> {
        let backend = match (config.index.mode, embedder) {
            (IndexMode::Online, Some(provider)) => SimilarityBackend::Dense {
                provider,
                batch_size: config.embedding.batch_size,
            },
            (IndexMode::Online, None) => bail!("online mode requires an embedding provider"),
            (IndexMode::Offline, _) => SimilarityBackend::Sparse {
                max_features: config.retrieval.max_features,
            },
        };

        let locks = Arc::new(TenantLocks::new());
        let indexer = Indexer::new(
            store.clone(),
            backend.clone(),
            config.chunking.max_chars,
            locks.clone(),
        );
        let searcher = Arc::new(Searcher::new(
            store.clone(),
            backend,
            config.retrieval.preview_chars,
            locks,
        ));
        let pipeline = AnswerPipeline::new(
            searcher.clone(),
            generator,
            config.answer_mode(),
            config.retrieval.top_k,
        );

        Ok(Self {
            config,
            store,
            indexer,
            searcher,
            pipeline,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    pub fn pipeline(&self) -> &AnswerPipeline {
        &self.pipeline
    }

    pub async fn status(&self, tenant: &str) -> Result<TenantStatus, RagError> {
        validate_tenant(tenant)?;
        let backend = self.config.backend_kind();
        let chunks = match self.store.load_corpus(tenant).await? {
            LoadOutcome::Found(c) => Some(c.len()),
            _ => None,
        };
        let rows = match self.store.load_artifact(tenant, backend).await? {
            LoadOutcome::Found(a) => Some(a.rows()),
            _ => None,
        };
        Ok(TenantStatus {
            tenant: tenant.to_string(),
            chunks,
            backend,
            rows,
        })
    }
}
