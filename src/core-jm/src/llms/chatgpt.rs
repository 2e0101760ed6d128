use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

use super::LlmProvider;
use crate::Error;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Chat completion through the OpenAI API.
pub struct ChatGpt {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatGpt {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(OpenAIConfig::new().with_api_key(api_key)),
            model: model.into(),
        }
    }

    /// Requires `OPENAI_API_KEY`; `OPENAI_MODEL` is optional.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::ConfigurationMissing("OPENAI_API_KEY".to_string()))?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }
}

#[async_trait]
impl LlmProvider for ChatGpt {
    async fn generate(&self, system: &str, user: &str) -> Result<String, Error> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::GenerationServiceFailure("No response from ChatGPT".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::is_env_set;
    use crate::llms::ENRICHMENT_SYSTEM_PROMPT;

    #[tokio::test]
    async fn test_generate_with_live_api() {
        if is_env_set("OPENAI_API_KEY") {
            let provider = ChatGpt::from_env().unwrap();
            let result = provider
                .generate(
                    ENRICHMENT_SYSTEM_PROMPT,
                    "Job Description:\nDesenvolvedor Rust Pleno, remoto. Requisitos: Rust, Tokio, PostgreSQL.",
                )
                .await;

            match result {
                Ok(response) => {
                    println!("ChatGPT response: {}", response);
                    assert!(!response.is_empty(), "Response should not be empty");
                }
                Err(e) => panic!("API error: {}", e),
            }
        } else {
            println!("[SKIP] OPENAI_API_KEY is not set");
        }
    }
}
