//! Starter "quick facts" shown before a user asks anything.

use serde::Serialize;

use scholask_core::models::ChunkMeta;
use scholask_core::RagError;

use crate::answer::{AnswerOutcome, AnswerPipeline};

/// `(title, question)` pairs, in display order.
pub const STARTER_QUESTIONS: &[(&str, &str)] = &[
    (
        "Overview",
        "Provide a brief overview of this school (location, type, key programs).",
    ),
    (
        "Contact",
        "What are the main contact details (phone/email) for Admissions or General Inquiries?",
    ),
    ("Apply", "What are the basic steps to apply as a new student?"),
    ("Tuition", "Where can I find information about tuition and fees?"),
    ("Deadlines", "Are there any upcoming important dates or deadlines?"),
];

pub const DEFAULT_FACT_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Fact {
    pub title: String,
    pub answer: String,
    pub sources: Vec<ChunkMeta>,
}

/// Answer the first `limit` starter questions for `tenant`.
///
/// Questions the index cannot answer get a short pointer instead.
pub async fn facts(
    pipeline: &AnswerPipeline,
    tenant: &str,
    limit: usize,
) -> Result<Vec<Fact>, RagError> {
    let mut out = Vec::new();
    for (title, question) in STARTER_QUESTIONS.iter().take(limit) {
        let answer = pipeline.answer(tenant, question).await?;
        let fact = match answer.outcome {
            AnswerOutcome::NoContext | AnswerOutcome::Failed => Fact {
                title: title.to_string(),
                answer: format!("Please ask about '{}' or check the school website.", title),
                sources: Vec::new(),
            },
            AnswerOutcome::Generated | AnswerOutcome::Extracted => Fact {
                title: title.to_string(),
                answer: answer.answer,
                sources: answer.sources,
            },
        };
        out.push(fact);
    }
    Ok(out)
}
