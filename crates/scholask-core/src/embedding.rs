//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, [`embed_aligned`] which enforces one vector per input text,
//! and pure helpers for vector serialization and similarity.
//!
//! Concrete providers (OpenAI) live in the `scholask` app crate.

use async_trait::async_trait;
use tracing::warn;

use crate::error::RagError;

/// Added to the norm product so zero vectors score `0.0` instead of NaN.
pub const COSINE_EPSILON: f32 = 1e-9;

/// Trait for embedding providers.
///
/// `embed` must return one vector per input, in input order. Individual
/// vectors may be empty or malformed; [`embed_aligned`] repairs those.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Embed `texts` in batches, guaranteeing exactly one `dims`-length vector
/// per input.
///
/// A batch whose response length differs from the request is an
/// [`RagError::Embedding`]. A single empty or wrong-dimension vector is
/// replaced by a zero placeholder and logged. If every vector had to be
/// replaced the whole call fails.
pub async fn embed_aligned(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    let dims = provider.dims();
    if dims == 0 {
        return Err(RagError::embedding(format!(
            "provider '{}' reports zero dimensions",
            provider.model_name()
        )));
    }

    let mut out = Vec::with_capacity(texts.len());
    let mut placeholders = 0usize;

    for batch in texts.chunks(batch_size.max(1)) {
        let vectors = provider.embed(batch).await?;
        if vectors.len() != batch.len() {
            return Err(RagError::embedding(format!(
                "expected {} vectors, provider returned {}",
                batch.len(),
                vectors.len()
            )));
        }
        for vector in vectors {
            if vector.len() == dims && vector.iter().all(|v| v.is_finite()) {
                out.push(vector);
            } else {
                warn!(
                    position = out.len(),
                    got = vector.len(),
                    expected = dims,
                    "substituting placeholder vector for missing embedding"
                );
                placeholders += 1;
                out.push(vec![0.0; dims]);
            }
        }
    }

    if !texts.is_empty() && placeholders == texts.len() {
        return Err(RagError::embedding("provider returned no usable vectors"));
    }
    Ok(out)
}

/// Scale `v` to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Encode a float vector as little-endian f32 bytes.
///
/// # Example
///
/// ```rust
/// use scholask_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes. Reverses [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        dims: usize,
        reply: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(self.reply.iter().take(texts.len()).cloned().collect())
        }
    }

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embed_aligned_substitutes_placeholder() {
        let provider = FixedProvider {
            dims: 2,
            reply: vec![vec![1.0, 0.0], vec![], vec![0.0, 1.0]],
        };
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let out = embed_aligned(&provider, &texts, 8).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], vec![0.0, 0.0]);
        assert_eq!(out[2], vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_aligned_rejects_short_response() {
        let provider = FixedProvider {
            dims: 2,
            reply: vec![vec![1.0, 0.0]],
        };
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = embed_aligned(&provider, &texts, 8).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding { .. }));
    }

    #[tokio::test]
    async fn test_embed_aligned_rejects_all_placeholders() {
        let provider = FixedProvider {
            dims: 3,
            reply: vec![vec![1.0], vec![]],
        };
        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(embed_aligned(&provider, &texts, 1).await.is_err());
    }
}
