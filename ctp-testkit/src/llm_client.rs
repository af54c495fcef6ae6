use std::sync::Mutex;

use async_trait::async_trait;

use ctp_core::errors::CtpError;
use ctp_core::traits::{LlmClient, LlmResponse, PromptMode, TokenUsage};

/// An `LlmClient` that returns a fixed response (or a scripted sequence of
/// responses) without making any network call.
pub struct FakeLlmClient {
    responses: Mutex<Vec<LlmResponse>>,
    default_text: String,
}

impl FakeLlmClient {
    pub fn always(text: impl Into<String>) -> Self {
        Self { responses: Mutex::new(Vec::new()), default_text: text.into() }
    }

    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        Self { responses: Mutex::new(responses), default_text: String::new() }
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn analyze(&self, _prompt: &str, _mode: PromptMode) -> Result<LlmResponse, CtpError> {
        let mut scripted = self.responses.lock().unwrap();
        if !scripted.is_empty() {
            return Ok(scripted.remove(0));
        }
        Ok(LlmResponse { text: self.default_text.clone(), usage: TokenUsage::default() })
    }
}

/// An `LlmClient` that always fails, for breaker/retry tests.
pub struct FailingLlmClient;

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn analyze(&self, _prompt: &str, _mode: PromptMode) -> Result<LlmResponse, CtpError> {
        Err(CtpError::Resource("fake llm client: simulated failure".to_string()))
    }
}
