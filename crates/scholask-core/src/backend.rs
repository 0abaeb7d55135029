//! Similarity backends and the index artifacts they produce.
//!
//! [`SimilarityBackend`] is selected once from process configuration and
//! has two variants:
//!
//! | Variant | Representation | Artifact |
//! |---------|----------------|----------|
//! | `Dense` | embedding vectors from an [`EmbeddingProvider`], L2-normalized | [`DenseIndex`] |
//! | `Sparse` | TF-IDF rows fitted on the whole corpus | [`SparseIndex`] |
//!
//! Both expose the same contract: `represent(texts) -> artifact` for a full
//! rebuild, and `represent_query` + `score` for search. A tenant's artifact
//! always has exactly one row per chunk, in chunk id order.

use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::embedding::{
    blob_to_vec, dot, embed_aligned, l2_normalize, vec_to_blob, EmbeddingProvider,
};
use crate::error::RagError;
use crate::sparse::{SparseIndex, SparseRow};

const DENSE_MAGIC: &[u8; 4] = b"SQDV";
const DENSE_VERSION: u32 = 1;
const DENSE_HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Dense,
    Sparse,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Dense => "dense",
            BackendKind::Sparse => "sparse",
        }
    }

    pub fn other(&self) -> BackendKind {
        match self {
            BackendKind::Dense => BackendKind::Sparse,
            BackendKind::Sparse => BackendKind::Dense,
        }
    }
}

/// Unit-normalized embedding rows plus their dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseIndex {
    pub dims: usize,
    pub vectors: Vec<Vec<f32>>,
}

impl DenseIndex {
    /// Build an index, normalizing every vector.
    pub fn from_vectors(dims: usize, mut vectors: Vec<Vec<f32>>) -> Self {
        for v in vectors.iter_mut() {
            l2_normalize(v);
        }
        Self { dims, vectors }
    }

    /// Dot product of a normalized query against every row.
    pub fn score(&self, query: &[f32]) -> Vec<f32> {
        self.vectors.iter().map(|row| dot(query, row)).collect()
    }

    /// Serialize as `SQDV | version | dims | rows | f32 LE data`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(DENSE_HEADER_LEN + self.vectors.len() * self.dims * 4);
        bytes.extend_from_slice(DENSE_MAGIC);
        bytes.extend_from_slice(&DENSE_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dims as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.vectors.len() as u32).to_le_bytes());
        for v in &self.vectors {
            bytes.extend_from_slice(&vec_to_blob(v));
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DENSE_HEADER_LEN || &bytes[..4] != DENSE_MAGIC {
            bail!("not a dense index file");
        }
        let read_u32 = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let version = read_u32(4);
        if version != DENSE_VERSION {
            bail!("unsupported dense index version {}", version);
        }
        let dims = read_u32(8) as usize;
        let rows = read_u32(12) as usize;

        let body = &bytes[DENSE_HEADER_LEN..];
        if body.len() != rows * dims * 4 {
            bail!(
                "dense index body is {} bytes, expected {} rows × {} dims",
                body.len(),
                rows,
                dims
            );
        }
        let vectors = if dims == 0 {
            vec![Vec::new(); rows]
        } else {
            body.chunks_exact(dims * 4).map(blob_to_vec).collect()
        };
        Ok(Self { dims, vectors })
    }
}

/// A tenant's derived index, one row per chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexArtifact {
    Dense(DenseIndex),
    Sparse(SparseIndex),
}

impl IndexArtifact {
    pub fn kind(&self) -> BackendKind {
        match self {
            IndexArtifact::Dense(_) => BackendKind::Dense,
            IndexArtifact::Sparse(_) => BackendKind::Sparse,
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            IndexArtifact::Dense(d) => d.vectors.len(),
            IndexArtifact::Sparse(s) => s.len(),
        }
    }
}

/// A query in the representation of one backend.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRepr {
    Dense(Vec<f32>),
    Sparse(SparseRow),
}

/// Strategy for turning text into comparable representations.
#[derive(Clone)]
pub enum SimilarityBackend {
    Dense {
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    },
    Sparse {
        max_features: usize,
    },
}

impl SimilarityBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            SimilarityBackend::Dense { .. } => BackendKind::Dense,
            SimilarityBackend::Sparse { .. } => BackendKind::Sparse,
        }
    }

    /// Compute a fresh artifact for the whole corpus.
    pub async fn represent(&self, texts: &[String]) -> Result<IndexArtifact, RagError> {
        match self {
            SimilarityBackend::Dense {
                provider,
                batch_size,
            } => {
                let vectors = embed_aligned(provider.as_ref(), texts, *batch_size).await?;
                Ok(IndexArtifact::Dense(DenseIndex::from_vectors(
                    provider.dims(),
                    vectors,
                )))
            }
            SimilarityBackend::Sparse { max_features } => {
                Ok(IndexArtifact::Sparse(SparseIndex::fit(texts, *max_features)))
            }
        }
    }

    /// Represent a query against a stored artifact.
    ///
    /// Sparse queries use the artifact's own fitted vocabulary.
    pub async fn represent_query(
        &self,
        query: &str,
        artifact: &IndexArtifact,
    ) -> Result<QueryRepr, RagError> {
        match (self, artifact) {
            (SimilarityBackend::Dense { provider, .. }, IndexArtifact::Dense(index)) => {
                let mut vectors = embed_aligned(provider.as_ref(), &[query.to_string()], 1).await?;
                let mut vector = vectors.pop().unwrap_or_default();
                if vector.len() != index.dims {
                    return Err(RagError::embedding(format!(
                        "query vector has {} dims, index has {}",
                        vector.len(),
                        index.dims
                    )));
                }
                l2_normalize(&mut vector);
                Ok(QueryRepr::Dense(vector))
            }
            (SimilarityBackend::Sparse { .. }, IndexArtifact::Sparse(index)) => {
                Ok(QueryRepr::Sparse(index.transform(query)))
            }
            _ => Err(RagError::Config(format!(
                "{} backend cannot query a {} artifact",
                self.kind().as_str(),
                artifact.kind().as_str()
            ))),
        }
    }

    /// Similarity of `query` against every artifact row, in row order.
    pub fn score(query: &QueryRepr, artifact: &IndexArtifact) -> Result<Vec<f32>, RagError> {
        match (query, artifact) {
            (QueryRepr::Dense(q), IndexArtifact::Dense(index)) => Ok(index.score(q)),
            (QueryRepr::Sparse(q), IndexArtifact::Sparse(index)) => Ok(index.score(q)),
            _ => Err(RagError::Config(
                "query representation does not match artifact kind".to_string(),
            )),
        }
    }
}
