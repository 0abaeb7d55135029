//! Paragraph-boundary text chunker.
//!
//! Splits raw text into bounded passages. Blank-line-separated blocks are
//! the natural units and are never merged; a block longer than `max_chars`
//! is cut into windows of at most `max_chars` characters.
//!
//! # Algorithm
//!
//! 1. Normalize `\r\n` to `\n`.
//! 2. Group consecutive non-blank lines into blocks (a line containing only
//!    whitespace separates blocks).
//! 3. Emit each block that fits within `max_chars` as-is (trimmed).
//! 4. Cut oversized blocks on a sliding window of `max_chars` characters,
//!    ending the window after the last newline inside it when there is one,
//!    otherwise exactly at the limit.
//!
//! Limits count Unicode scalar values, not bytes.
//!
//! # Example
//!
//! ```rust
//! use scholask_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", 1200);
//! assert_eq!(chunks, vec!["Hello world.", "Second paragraph."]);
//! ```

/// Default window size in characters.
pub const DEFAULT_MAX_CHARS: usize = 1200;

/// Split text into trimmed, non-empty passages of at most `max_chars` characters.
///
/// Empty or whitespace-only input yields an empty vector. Output order
/// follows input order and is deterministic.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let normalized = text.replace("\r\n", "\n");

    let mut chunks = Vec::new();
    for block in split_blocks(&normalized) {
        if block.chars().count() <= max_chars {
            chunks.push(block);
        } else {
            split_oversized(&block, max_chars, &mut chunks);
        }
    }
    chunks
}

/// Group non-blank lines into trimmed blocks.
fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            flush_block(&mut current, &mut blocks);
        } else {
            current.push(line);
        }
    }
    flush_block(&mut current, &mut blocks);
    blocks
}

fn flush_block(lines: &mut Vec<&str>, blocks: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
    lines.clear();
}

fn split_oversized(block: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut remaining = block;
    while !remaining.is_empty() {
        let limit = byte_offset_of_char(remaining, max_chars);
        if limit >= remaining.len() {
            push_trimmed(remaining, out);
            break;
        }

        let window = &remaining[..limit];
        let cut = match window.rfind('\n') {
            Some(pos) if pos > 0 => pos + 1,
            _ => limit,
        };

        push_trimmed(&remaining[..cut], out);
        remaining = remaining[cut..].trim_start();
    }
}

fn push_trimmed(piece: &str, out: &mut Vec<String>) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Byte offset of the `n`-th character, or `s.len()` if there are fewer.
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 1200);
        assert_eq!(chunks, vec!["Hello, world!"]);
    }

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        assert!(chunk_text("", 1200).is_empty());
        assert!(chunk_text("   \n\n\t  \n", 1200).is_empty());
    }

    #[test]
    fn test_paragraphs_are_separate_units() {
        let text = "First paragraph.\n\nSecond paragraph.\n  \nThird paragraph.";
        let chunks = chunk_text(text, 1200);
        assert_eq!(
            chunks,
            vec!["First paragraph.", "Second paragraph.", "Third paragraph."]
        );
    }

    #[test]
    fn test_crlf_blank_lines() {
        let chunks = chunk_text("one\r\n\r\ntwo", 1200);
        assert_eq!(chunks, vec!["one", "two"]);
    }

    #[test]
    fn test_oversized_block_prefers_newline() {
        let text = format!("{}\n{}", "a".repeat(8), "b".repeat(8));
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks, vec!["a".repeat(8), "b".repeat(8)]);
    }

    #[test]
    fn test_oversized_block_without_newline_cuts_at_limit() {
        let text = "x".repeat(25);
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn test_every_chunk_bounded_and_nonempty() {
        let text = (0..200)
            .map(|i| format!("line number {} with some words", i))
            .collect::<Vec<_>>()
            .join("\n");
        for c in chunk_text(&text, 120) {
            assert!(!c.is_empty());
            assert!(c.chars().count() <= 120);
            assert_eq!(c, c.trim());
        }
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let text = "┌──────────────────┐\n│ Hello world      │\n└──────────────────┘";
        let chunks = chunk_text(text, 7);
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.chars().count() <= 7);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = format!("Alpha\n\n{}\n\nGamma", "beta ".repeat(400));
        assert_eq!(chunk_text(&text, 300), chunk_text(&text, 300));
    }
}
