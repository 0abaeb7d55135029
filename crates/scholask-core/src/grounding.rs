//! Grounding prompt and fixed user-facing answer texts.
//!
//! The prompt pins the assistant to one tenant, restricts it to the
//! supplied context, and requires `[#n]` citations that match the markers
//! produced by [`assemble_context`](crate::context::assemble_context).

use crate::context::citation_marker;
use crate::models::{ChunkMeta, RetrievedPassage};

/// Returned when generation succeeded but produced no text.
pub const EMPTY_ANSWER_MESSAGE: &str = "I found some relevant information, but I couldn't formulate a specific answer. Please try rephrasing your question or check the sources provided.";

/// Returned when the generation capability failed or is not configured.
pub const GENERATION_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. Please try again later.";

/// Maximum number of bullets in an extractive answer.
pub const EXTRACT_MAX_BULLETS: usize = 4;

/// Maximum characters per extractive bullet.
pub const EXTRACT_BULLET_CHARS: usize = 150;

const OFFLINE_DISCLAIMER: &str =
    "(Offline mode - information may be limited. Please check online when possible.)";

const INSTRUCTIONS: &str = "\
Rules:
1. Answer only from the Context below. Do not use outside knowledge.
2. Cite every fact immediately with the marker of the passage that supports it, e.g. [#1] or [#2, #3].
3. If the Context answers the question fully, give a complete, structured answer with citations.
4. If the Context answers only part of the question, state what is known (with citations), name the specific information that is missing, and recommend the relevant office (for example Admissions, the Registrar, or International Student Services) or the official website.
5. If the Context does not answer the question, say that you have no verified information on that topic and recommend contacting the appropriate department.
6. Never invent facts, URLs, phone numbers, email addresses, or dates.
7. Reply in the language of the question.
8. Prefer concrete details from the Context (deadlines, room numbers, policy names) and point to a next step when one exists.";

fn persona(display_name: &str) -> String {
    format!(
        "You are Scholask, the official advisor and assistant for {name}. \
You are friendly, patient, and precise, and you help prospective students, \
current students, and parents with {name}'s policies, procedures, deadlines, \
and resources.",
        name = display_name
    )
}

/// Full prompt for the generation capability.
pub fn build_prompt(display_name: &str, context: &str, question: &str) -> String {
    format!(
        "{persona}\n\n{INSTRUCTIONS}\n\nContext:\n---\n{context}\n---\n\nQuestion: {question}\n\nAnswer (cite sources like [#1] right after each fact):",
        persona = persona(display_name),
    )
}

/// Fixed answer when retrieval found nothing.
pub fn no_context_message(display_name: &str) -> String {
    format!(
        "I couldn't find verified information about that topic in the current knowledge base for {}. You may want to check the official website or contact the relevant department directly.",
        display_name
    )
}

/// Offline answer: the lead sentence of up to four passages, each cited.
///
/// Returns the answer text and the metadata of the passages actually used.
pub fn extractive_answer(
    display_name: &str,
    passages: &[RetrievedPassage],
) -> (String, Vec<ChunkMeta>) {
    let mut bullets = Vec::new();
    let mut used = Vec::new();

    for p in passages {
        let text = p.text.trim();
        if text.is_empty() {
            continue;
        }
        bullets.push(format!(
            "- {} {}",
            shorten(&lead_sentence(text), EXTRACT_BULLET_CHARS),
            citation_marker(p.meta.id)
        ));
        used.push(p.meta.clone());
        if bullets.len() >= EXTRACT_MAX_BULLETS {
            break;
        }
    }

    let answer = format!(
        "Based on available offline information for {}:\n{}\n\n{}",
        display_name,
        bullets.join("\n"),
        OFFLINE_DISCLAIMER
    );
    (answer, used)
}

fn lead_sentence(text: &str) -> String {
    match text.split_once('.') {
        Some((first, _)) => format!("{}.", first),
        None => format!("{}.", text),
    }
}

/// Collapse whitespace and cut at a word boundary so the result fits in
/// `width` characters, marking cuts with `...`.
pub fn shorten(text: &str, width: usize) -> String {
    const ELLIPSIS: &str = "...";

    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut out = String::new();
    for word in words {
        let extra = if out.is_empty() { 0 } else { 1 } + word.chars().count();
        if out.chars().count() + extra > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = collapsed.chars().take(budget).collect();
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchHit;

    fn passage(id: usize, text: &str) -> RetrievedPassage {
        RetrievedPassage {
            hit: SearchHit {
                chunk_id: id,
                score: 1.0,
            },
            text: text.to_string(),
            meta: ChunkMeta {
                id,
                preview: text.to_string(),
                source_url: None,
            },
        }
    }

    #[test]
    fn test_prompt_contains_all_parts() {
        let prompt = build_prompt("Seattle Central College", "[#1]\nTuition is $100.", "How much?");
        assert!(prompt.starts_with("You are Scholask, the official advisor and assistant for Seattle Central College."));
        assert!(prompt.contains("Answer only from the Context"));
        assert!(prompt.contains("Context:\n---\n[#1]\nTuition is $100.\n---"));
        assert!(prompt.contains("Question: How much?"));
    }

    #[test]
    fn test_no_context_message_names_tenant() {
        assert!(no_context_message("Mit").contains("knowledge base for Mit."));
    }

    #[test]
    fn test_extractive_answer_limits_bullets() {
        let passages: Vec<_> = (0..6)
            .map(|i| passage(i, &format!("Fact number {}. More detail here.", i)))
            .collect();
        let (answer, used) = extractive_answer("Mit", &passages);
        assert!(answer.starts_with("Based on available offline information for Mit:\n- Fact number 0. [#1]"));
        assert!(answer.contains("- Fact number 3. [#4]"));
        assert!(!answer.contains("[#5]"));
        assert!(answer.ends_with(OFFLINE_DISCLAIMER));
        assert_eq!(used.len(), 4);
    }

    #[test]
    fn test_extractive_answer_skips_blank_text() {
        let (answer, used) = extractive_answer("Mit", &[passage(0, "   "), passage(2, "Only one")]);
        assert!(answer.contains("- Only one. [#3]"));
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].id, 2);
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("a  b\n c", 10), "a b c");
        let long = "word ".repeat(50);
        let s = shorten(&long, 20);
        assert!(s.chars().count() <= 20);
        assert!(s.ends_with("..."));
        assert_eq!(shorten(&"x".repeat(30), 10), "xxxxxxx...");
    }
}
