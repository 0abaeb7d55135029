//! Citation-annotated context assembly.
//!
//! Each retrieved passage is rendered as:
//!
//! ```text
//! [#3] (URL: https://example.edu/admissions)
//! Applications open in October.
//! ```
//!
//! and passages are joined with [`PASSAGE_SEPARATOR`]. The citation number
//! is the chunk's display index (`id + 1`), never its rank in the hit list,
//! so a passage keeps its number across different queries.

use crate::models::RetrievedPassage;

pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// `[#n]` marker for a chunk id.
pub fn citation_marker(chunk_id: usize) -> String {
    format!("[#{}]", chunk_id + 1)
}

fn header(passage: &RetrievedPassage) -> String {
    let marker = citation_marker(passage.meta.id);
    match passage.meta.source_url.as_deref() {
        Some(url) if !url.is_empty() => format!("{} (URL: {})", marker, url),
        _ => marker,
    }
}

/// Render passages in the order given.
pub fn assemble_context(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| format!("{}\n{}", header(p), p.text))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMeta, SearchHit};

    fn passage(id: usize, text: &str, url: Option<&str>, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            hit: SearchHit {
                chunk_id: id,
                score,
            },
            text: text.to_string(),
            meta: ChunkMeta {
                id,
                preview: text.to_string(),
                source_url: url.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_header_with_and_without_url() {
        let ctx = assemble_context(&[
            passage(1, "Paragraph two about deadlines.", None, 0.9),
            passage(0, "Paragraph one about tuition.", Some("https://x.edu"), 0.1),
        ]);
        assert_eq!(
            ctx,
            "[#2]\nParagraph two about deadlines.\n\n---\n\n[#1] (URL: https://x.edu)\nParagraph one about tuition."
        );
    }

    #[test]
    fn test_marker_follows_id_not_rank() {
        let a = assemble_context(&[passage(4, "x", None, 0.9), passage(0, "y", None, 0.1)]);
        let b = assemble_context(&[passage(0, "y", None, 0.9), passage(4, "x", None, 0.1)]);
        assert!(a.starts_with("[#5]\nx"));
        assert!(b.ends_with("[#5]\nx"));
    }

    #[test]
    fn test_empty_passages() {
        assert_eq!(assemble_context(&[]), "");
    }
}
