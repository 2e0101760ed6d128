//! Mock LLM provider for testing
//!
//! Returns predefined responses or errors without making real API calls.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{Error, llms::LlmProvider};

/// Mock LLM provider for testing
///
/// Can be configured to:
/// - Return specific responses when the user content contains a given text
/// - Return a default response for any request
/// - Simulate service failures, for every request or selected ones
pub struct MockLlmProvider {
    /// (user content substring, response), checked in insertion order
    responses: Vec<(String, String)>,
    /// User content substrings that make the call fail
    failures: Vec<String>,
    default_response: Option<String>,
    should_fail: bool,
    calls: AtomicUsize,
    /// Every (system, user) pair received
    requests: Mutex<Vec<(String, String)>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            failures: Vec::new(),
            default_response: None,
            should_fail: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that answers `response` when the user content contains `user_contains`
    pub fn with_response(user_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(user_contains, response);
        provider
    }

    /// Create a mock with a default response for any request
    pub fn with_default(response: &str) -> Self {
        let mut provider = Self::new();
        provider.set_default(response);
        provider
    }

    /// Create a mock that always fails
    pub fn with_failure() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    pub fn add_response(&mut self, user_contains: &str, response: &str) {
        self.responses.push((user_contains.to_string(), response.to_string()));
    }

    /// Requests whose user content contains `user_contains` fail
    pub fn add_failure(&mut self, user_contains: &str) {
        self.failures.push(user_contains.to_string());
    }

    pub fn set_default(&mut self, response: &str) {
        self.default_response = Some(response.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((system.to_string(), user.to_string()));

        if self.should_fail || self.failures.iter().any(|f| user.contains(f.as_str())) {
            return Err(Error::GenerationServiceFailure(
                "Mock LLM provider configured to fail".to_string(),
            ));
        }

        if let Some((_, response)) = self.responses.iter().find(|(key, _)| user.contains(key.as_str())) {
            return Ok(response.clone());
        }

        if let Some(default) = &self.default_response {
            return Ok(default.clone());
        }

        Err(Error::GenerationServiceFailure(
            "Mock LLM provider has no response configured for this request".to_string(),
        ))
    }
}

/// A well-formed structured summary, as the service is asked to produce it.
pub fn sample_enriched_description() -> &'static str {
    "🏢 Cargo: Desenvolvedor Backend
📈 Nível: Pleno
📍 Local & Regime: Remoto
🎯 Hard Skills (Obrigatórias): Rust, Tokio, PostgreSQL
✨ Hard Skills (Desejáveis): Kubernetes
📝 Formação/Certificação: Não informado
⚙️ Atividades Principais:
- Desenvolver serviços assíncronos em Rust."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_with_default_response() {
        let provider = MockLlmProvider::with_default("test response");
        let result = provider.generate("system", "any content").await.unwrap();
        assert_eq!(result, "test response");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_specific_response() {
        let mut provider = MockLlmProvider::with_response("Rust", "rust summary");
        provider.set_default("fallback");

        assert_eq!(provider.generate("s", "Vaga Rust").await.unwrap(), "rust summary");
        assert_eq!(provider.generate("s", "Vaga Java").await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_mock_failures() {
        assert!(MockLlmProvider::with_failure().generate("s", "u").await.is_err());

        let mut provider = MockLlmProvider::with_default("ok");
        provider.add_failure("quebrada");
        assert!(provider.generate("s", "vaga quebrada").await.is_err());
        assert!(provider.generate("s", "vaga boa").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_no_response_configured() {
        let provider = MockLlmProvider::new();
        assert!(provider.generate("s", "u").await.is_err());
        assert_eq!(provider.requests(), vec![("s".to_string(), "u".to_string())]);
    }
}
