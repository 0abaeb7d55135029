//! Answer pipeline: search → assemble → generate or extract.
//!
//! ```text
//! Searching ─┬─ no hits / unavailable ──────────────▶ NoContext
//!            └─ hits ─▶ context ─┬─ generate ─┬─ ok ─▶ Generated
//!                                │            └─ err ─▶ Failed
//!                                └─ extract ─────────▶ Extracted
//! ```
//!
//! A configured generator that fails never falls back to extraction; the
//! caller gets [`AnswerOutcome::Failed`] with a generic message and no
//! sources, and the failure is logged with `outcome = "failed"`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use scholask_core::context::assemble_context;
use scholask_core::generation::GenerationProvider;
use scholask_core::grounding::{
    build_prompt, extractive_answer, no_context_message, EMPTY_ANSWER_MESSAGE,
    GENERATION_ERROR_MESSAGE,
};
use scholask_core::models::{ChunkMeta, RetrievedPassage};
use scholask_core::tenant::{display_name, validate_tenant};
use scholask_core::RagError;

use crate::config::AnswerMode;
use crate::search::Searcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    NoContext,
    Generated,
    Extracted,
    Failed,
}

impl AnswerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOutcome::NoContext => "no_context",
            AnswerOutcome::Generated => "generated",
            AnswerOutcome::Extracted => "extracted",
            AnswerOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<ChunkMeta>,
    pub outcome: AnswerOutcome,
}

impl Answer {
    fn no_context(display: &str) -> Self {
        Self {
            answer: no_context_message(display),
            sources: Vec::new(),
            outcome: AnswerOutcome::NoContext,
        }
    }

    fn failed() -> Self {
        Self {
            answer: GENERATION_ERROR_MESSAGE.to_string(),
            sources: Vec::new(),
            outcome: AnswerOutcome::Failed,
        }
    }
}

pub struct AnswerPipeline {
    searcher: Arc<Searcher>,
    generator: Option<Arc<dyn GenerationProvider>>,
    mode: AnswerMode,
    top_k: usize,
}

impl AnswerPipeline {
    pub fn new(
        searcher: Arc<Searcher>,
        generator: Option<Arc<dyn GenerationProvider>>,
        mode: AnswerMode,
        top_k: usize,
    ) -> Self {
        Self {
            searcher,
            generator,
            mode,
            top_k,
        }
    }

    pub async fn answer(&self, tenant: &str, question: &str) -> Result<Answer, RagError> {
        self.answer_with_k(tenant, question, self.top_k).await
    }

    /// Answer `question` for `tenant` from the `k` best passages.
    ///
    /// Only an invalid tenant identifier is an `Err`; every other failure
    /// is folded into the returned [`Answer`].
    pub async fn answer_with_k(
        &self,
        tenant: &str,
        question: &str,
        k: usize,
    ) -> Result<Answer, RagError> {
        validate_tenant(tenant)?;
        let display = display_name(tenant);

        let passages = match self.searcher.retrieve(tenant, question, k).await {
            Ok(p) => p,
            Err(RagError::SearchUnavailable { reason, .. }) => {
                warn!(tenant, %reason, outcome = "no_context", "search unavailable");
                return Ok(Answer::no_context(&display));
            }
            Err(e) => {
                error!(tenant, error = %e, outcome = "failed", "retrieval failed");
                return Ok(Answer::failed());
            }
        };

        if passages.is_empty() {
            info!(tenant, outcome = "no_context", "no passages retrieved");
            return Ok(Answer::no_context(&display));
        }

        let answer = match self.mode {
            AnswerMode::Extract => {
                let (answer, sources) = extractive_answer(&display, &passages);
                Answer {
                    answer,
                    sources,
                    outcome: AnswerOutcome::Extracted,
                }
            }
            AnswerMode::Generate => self.generate(tenant, &display, question, &passages).await,
        };

        info!(
            tenant,
            passages = passages.len(),
            sources = answer.sources.len(),
            outcome = answer.outcome.as_str(),
            "answered"
        );
        Ok(answer)
    }

    async fn generate(
        &self,
        tenant: &str,
        display: &str,
        question: &str,
        passages: &[RetrievedPassage],
    ) -> Answer {
        let Some(generator) = &self.generator else {
            error!(tenant, outcome = "failed", "generate mode without a generation provider");
            return Answer::failed();
        };

        let prompt = build_prompt(display, &assemble_context(passages), question);
        match generator.generate(&prompt).await {
            Ok(text) => {
                let sources = passages.iter().map(|p| p.meta.clone()).collect();
                let answer = if text.trim().is_empty() {
                    warn!(tenant, model = generator.model_name(), "generation returned empty text");
                    EMPTY_ANSWER_MESSAGE.to_string()
                } else {
                    text
                };
                Answer {
                    answer,
                    sources,
                    outcome: AnswerOutcome::Generated,
                }
            }
            Err(e) => {
                error!(
                    tenant,
                    model = generator.model_name(),
                    error = %e,
                    outcome = "failed",
                    "generation failed"
                );
                Answer::failed()
            }
        }
    }
}
