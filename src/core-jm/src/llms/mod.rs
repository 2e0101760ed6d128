pub mod chatgpt;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod ollama;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
pub use prompts::{ENRICHMENT_SYSTEM_PROMPT, prompt_enrich_job_description};

pub use chatgpt::ChatGpt;
pub use ollama::Ollama;

use crate::Error;

/// Interface to a text generation service that answers a system + user message pair.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, Error>;
}

/// Which generation service backs enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama,
    OpenAi,
}

impl LlmBackend {
    /// Reads `LLM_BACKEND`; unset means Ollama.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var("LLM_BACKEND") {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(LlmBackend::Ollama),
        }
    }

    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_lowercase().as_str() {
            "" | "ollama" => Ok(LlmBackend::Ollama),
            "openai" | "chatgpt" => Ok(LlmBackend::OpenAi),
            other => Err(Error::ConfigurationMissing(format!(
                "LLM_BACKEND must be 'ollama' or 'openai', got '{}'",
                other
            ))),
        }
    }
}

/// Builds the provider selected by `LLM_BACKEND`.
///
/// Fails with [`Error::ConfigurationMissing`] when the selected backend lacks its credentials.
pub fn provider_from_env() -> Result<Arc<dyn LlmProvider>, Error> {
    match LlmBackend::from_env()? {
        LlmBackend::Ollama => {
            let ollama = Ollama::from_env();
            tracing::info!("Enrichment backend: Ollama ({}) at {}", ollama.model(), ollama.chat_url());
            Ok(Arc::new(ollama))
        }
        LlmBackend::OpenAi => {
            let chatgpt = ChatGpt::from_env()?;
            tracing::info!("Enrichment backend: OpenAI");
            Ok(Arc::new(chatgpt))
        }
    }
}

/// Structured summary of `raw_description`, or an error if the service produced nothing usable.
pub async fn enrich_description(provider: &dyn LlmProvider, raw_description: &str) -> Result<String, Error> {
    let user = prompt_enrich_job_description(raw_description)?;
    let response = provider.generate(ENRICHMENT_SYSTEM_PROMPT, &user).await?;

    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(Error::GenerationServiceFailure("empty response".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock::MockLlmProvider;

    #[test]
    fn test_backend_parse() {
        assert_eq!(LlmBackend::parse("ollama").unwrap(), LlmBackend::Ollama);
        assert_eq!(LlmBackend::parse(" OpenAI ").unwrap(), LlmBackend::OpenAi);
        assert_eq!(LlmBackend::parse("").unwrap(), LlmBackend::Ollama);
        assert!(matches!(LlmBackend::parse("claude"), Err(Error::ConfigurationMissing(_))));
    }

    #[tokio::test]
    async fn test_enrich_description_sends_fixed_instruction() {
        let provider = MockLlmProvider::with_default("  🏢 Cargo: Dev\n");
        let enriched = enrich_description(&provider, "Dev Rust").await.unwrap();

        assert_eq!(enriched, "🏢 Cargo: Dev");
        let requests = provider.requests();
        assert_eq!(requests[0].0, ENRICHMENT_SYSTEM_PROMPT);
        assert_eq!(requests[0].1, "Job Description:\nDev Rust");
    }

    #[tokio::test]
    async fn test_enrich_description_rejects_blank_response() {
        let provider = MockLlmProvider::with_default(" \n\t ");
        let result = enrich_description(&provider, "Dev Rust").await;
        assert!(matches!(result, Err(Error::GenerationServiceFailure(_))));
    }
}
