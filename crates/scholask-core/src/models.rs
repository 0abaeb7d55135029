//! Core data models used throughout Scholask.
//!
//! A tenant's corpus is an append-only sequence of [`Chunk`]s whose ids are
//! their positions. The id is the citation key shown to users (as `id + 1`),
//! so it is assigned once, at append time, and never reused.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default number of characters kept in a metadata preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// A bounded unit of source text with a stable sequential id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub source_url: Option<String>,
}

/// Persisted per-chunk metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub id: usize,
    /// The first characters of the chunk text.
    pub preview: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl ChunkMeta {
    /// 1-based citation number rendered as `[#n]`.
    pub fn display_index(&self) -> usize {
        self.id + 1
    }
}

/// One tenant's full chunk sequence. Invariant: `chunks[i].id == i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantCorpus {
    pub tenant: String,
    chunks: Vec<Chunk>,
}

impl TenantCorpus {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            chunks: Vec::new(),
        }
    }

    /// Rebuild a corpus from persisted chunk texts and metadata records.
    ///
    /// When the record count differs from the chunk count, or the record ids
    /// are not `0..n`, the metadata is regenerated from the chunk texts. The
    /// source URL of each record that survives at the same position is kept.
    /// Returns the corpus and whether a repair happened.
    pub fn from_parts(
        tenant: impl Into<String>,
        texts: Vec<String>,
        metas: Vec<ChunkMeta>,
    ) -> (Self, bool) {
        let tenant = tenant.into();
        let consistent = texts.len() == metas.len()
            && metas.iter().enumerate().all(|(i, m)| m.id == i);
        if !consistent {
            warn!(
                tenant = %tenant,
                chunks = texts.len(),
                metas = metas.len(),
                "chunk/metadata count mismatch, regenerating metadata from chunk texts"
            );
        }

        let chunks = texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Chunk {
                id,
                text,
                source_url: metas.get(id).and_then(|m| m.source_url.clone()),
            })
            .collect();

        (Self { tenant, chunks }, !consistent)
    }

    /// Append new chunk texts, continuing the id sequence.
    ///
    /// This is the only place ids are assigned. Returns the new ids.
    pub fn append<I, S>(&mut self, texts: I, source_url: Option<&str>) -> Vec<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = self.chunks.len();
        for text in texts {
            let id = self.chunks.len();
            self.chunks.push(Chunk {
                id,
                text: text.into(),
                source_url: source_url.map(str::to_string),
            });
        }
        (start..self.chunks.len()).collect()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunk texts in id order.
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }

    /// Metadata records for every chunk, previews truncated to `preview_chars`.
    pub fn metas(&self, preview_chars: usize) -> Vec<ChunkMeta> {
        self.chunks
            .iter()
            .map(|c| meta_for(c, preview_chars))
            .collect()
    }
}

pub fn meta_for(chunk: &Chunk, preview_chars: usize) -> ChunkMeta {
    ChunkMeta {
        id: chunk.id,
        preview: chunk.text.chars().take(preview_chars).collect(),
        source_url: chunk.source_url.clone(),
    }
}

/// A ranked search result. Transient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: usize,
    pub score: f32,
}

/// A search hit joined with its chunk text and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedPassage {
    pub hit: SearchHit,
    pub text: String,
    pub meta: ChunkMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: usize, url: Option<&str>) -> ChunkMeta {
        ChunkMeta {
            id,
            preview: String::new(),
            source_url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_append_continues_sequence() {
        let mut corpus = TenantCorpus::new("t");
        assert_eq!(corpus.append(["A", "B"], None), vec![0, 1]);
        assert_eq!(corpus.append(["C", "D"], Some("https://x")), vec![2, 3]);
        assert_eq!(corpus.get(0).unwrap().text, "A");
        assert_eq!(corpus.get(3).unwrap().source_url.as_deref(), Some("https://x"));
        for (i, c) in corpus.chunks().iter().enumerate() {
            assert_eq!(c.id, i);
        }
    }

    #[test]
    fn test_from_parts_consistent() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let metas = vec![meta(0, Some("u0")), meta(1, None)];
        let (corpus, repaired) = TenantCorpus::from_parts("t", texts, metas);
        assert!(!repaired);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0).unwrap().source_url.as_deref(), Some("u0"));
    }

    #[test]
    fn test_from_parts_repairs_short_metadata() {
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let metas = vec![meta(0, Some("u0"))];
        let (corpus, repaired) = TenantCorpus::from_parts("t", texts, metas);
        assert!(repaired);
        let metas = corpus.metas(DEFAULT_PREVIEW_CHARS);
        assert_eq!(metas.len(), 3);
        assert_eq!(metas[0].source_url.as_deref(), Some("u0"));
        assert_eq!(metas[2].id, 2);
        assert_eq!(metas[2].preview, "c");
        assert_eq!(metas[2].source_url, None);
    }

    #[test]
    fn test_from_parts_repairs_bad_ids() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let metas = vec![meta(0, None), meta(7, None)];
        let (_, repaired) = TenantCorpus::from_parts("t", texts, metas);
        assert!(repaired);
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        let chunk = Chunk {
            id: 4,
            text: "héllo wörld".to_string(),
            source_url: None,
        };
        let m = meta_for(&chunk, 4);
        assert_eq!(m.preview, "héll");
        assert_eq!(m.display_index(), 5);
    }
}
