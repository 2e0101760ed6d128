use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LlmProvider;
use crate::Error;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Chat completion against a self-hosted Ollama server.
pub struct Ollama {
    client: reqwest::Client,
    host: String,
    model: String,
}

impl Ollama {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Uses `OLLAMA_HOST` and `OLLAMA_MODEL`, falling back to the local defaults.
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
        Self::new(host, model)
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for Ollama {
    async fn generate(&self, system: &str, user: &str) -> Result<String, Error> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        tracing::debug!("Sending chat request to Ollama ({}) at {}", self.model, self.host);
        let response = self.client.post(self.chat_url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GenerationServiceFailure(format!(
                "Ollama answered {}: {}",
                status, body
            )));
        }

        let body: ChatResponse = response.json().await?;
        body.message
            .map(|message| message.content)
            .ok_or_else(|| Error::GenerationServiceFailure("Ollama response without message".to_string()))
    }
}
