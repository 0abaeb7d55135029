//! Concrete text generation providers.
//!
//! [`OpenAIGenerationProvider`] calls `POST {base_url}/chat/completions`
//! with the whole grounding prompt as a single user message.
//! [`create_generator`] returns `None` when generation is disabled; the
//! answer pipeline treats that as a misconfiguration in generate mode.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use scholask_core::generation::GenerationProvider;
use scholask_core::RagError;

use crate::config::GenerationConfig;
use crate::http::{build_client, post_json_with_retry, DEFAULT_OPENAI_BASE_URL};

pub struct OpenAIGenerationProvider {
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: String,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIGenerationProvider {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/');
        let client = build_client(config.timeout_secs)?;

        Ok(Self {
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
            url: format!("{}/chat/completions", base),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAIGenerationProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });
        let json = post_json_with_retry(
            &self.client,
            &self.url,
            &self.api_key,
            &body,
            self.max_retries,
            |message, transient| RagError::Generation { message, transient },
        )
        .await?;

        parse_completion(&json)
    }
}

/// Text of the first choice, verbatim. A missing `content` is an empty answer.
fn parse_completion(json: &serde_json::Value) -> Result<String, RagError> {
    let choices = json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| RagError::Generation {
            message: "Invalid completion response: missing choices".to_string(),
            transient: false,
        })?;

    Ok(choices
        .first()
        .and_then(|c| c.pointer("/message/content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string())
}

pub fn create_generator(config: &GenerationConfig) -> Result<Option<Arc<dyn GenerationProvider>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "openai" => Ok(Some(Arc::new(OpenAIGenerationProvider::new(config)?))),
        other => bail!("Unknown generation provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  Tuition is $100 [#1].\n"}}]
        });
        assert_eq!(parse_completion(&json).unwrap(), "  Tuition is $100 [#1].\n");
    }

    #[test]
    fn test_parse_completion_empty_content() {
        let json = serde_json::json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(parse_completion(&json).unwrap(), "");
        let json = serde_json::json!({"choices": []});
        assert_eq!(parse_completion(&json).unwrap(), "");
    }

    #[test]
    fn test_parse_completion_rejects_malformed() {
        let err = parse_completion(&serde_json::json!({})).unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_disabled_generator_is_none() {
        assert!(create_generator(&GenerationConfig::default()).unwrap().is_none());
    }
}
