//! Sparse lexical backend: a TF-IDF vectorizer fitted per tenant.
//!
//! The fitted vocabulary and idf weights are part of the persisted artifact,
//! so queries are always transformed against the same fit that produced the
//! stored rows. A new fit is computed on every rebuild; nothing is shared
//! across tenants.
//!
//! # Weighting
//!
//! - Tokens: lowercase runs of alphanumeric/underscore characters, length ≥ 2.
//! - Vocabulary: the `max_features` most frequent terms across the corpus
//!   (ties broken by term order), columns assigned in sorted term order.
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
//! - Row weight: `count(t) × idf(t)`, each row L2-normalized.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::embedding::COSINE_EPSILON;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 4096;

/// A sparse row: `(column, weight)` pairs sorted by column.
pub type SparseRow = Vec<(u32, f32)>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseIndex {
    pub vocabulary: BTreeMap<String, u32>,
    pub idf: Vec<f32>,
    pub rows: Vec<SparseRow>,
}

/// Split text into lowercase terms of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

impl SparseIndex {
    /// Fit a vocabulary on `texts` and compute one row per text.
    pub fn fit(texts: &[String], max_features: usize) -> Self {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();

        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let mut seen: Vec<&str> = Vec::new();
            for term in doc {
                *corpus_freq.entry(term.as_str()).or_insert(0) += 1;
                if !seen.contains(&term.as_str()) {
                    seen.push(term.as_str());
                }
            }
            for term in seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(max_features.max(1));

        let mut terms: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort_unstable();

        let n = docs.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(terms.len());
        for (col, term) in terms.iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            vocabulary.insert((*term).to_string(), col as u32);
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
        }

        let mut index = Self {
            vocabulary,
            idf,
            rows: Vec::with_capacity(docs.len()),
        };
        let rows = docs.iter().map(|doc| index.weigh(doc)).collect();
        index.rows = rows;
        index
    }

    /// Transform a query with the stored vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseRow {
        self.weigh(&tokenize(text))
    }

    /// Cosine similarity between `query` and every stored row.
    pub fn score(&self, query: &[(u32, f32)]) -> Vec<f32> {
        let q_norm = row_norm(query);
        self.rows
            .iter()
            .map(|row| sparse_dot(query, row) / (q_norm * row_norm(row) + COSINE_EPSILON))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn weigh(&self, terms: &[String]) -> SparseRow {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for term in terms {
            if let Some(&col) = self.vocabulary.get(term) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(col, count)| (col, count * self.idf[col as usize]))
            .collect();

        let norm = row_norm(&row);
        if norm > f32::EPSILON {
            for (_, w) in row.iter_mut() {
                *w /= norm;
            }
        }
        row
    }
}

fn row_norm(row: &[(u32, f32)]) -> f32 {
    row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
}

/// Dot product of two column-sorted sparse rows.
fn sparse_dot(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0f32;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
