//! Default `LlmClient` (§6 "LLM client (consumed)"). The wire contract to
//! an actual model provider is explicitly out of scope: this crate ships
//! no HTTP client and assumes none of the prompt text this spec never
//! defines. `NullLlmClient` is the safe stand-in for a single-node run with
//! no provider configured — every call succeeds with an empty extraction so
//! the rest of the pipeline runs and seals cleanly. A real deployment
//! injects its own `LlmClient` into `Orchestrator::new`.

use async_trait::async_trait;

use ctp_core::errors::CtpError;
use ctp_core::traits::{LlmClient, LlmResponse, PromptMode, TokenUsage};

pub struct NullLlmClient;

#[async_trait]
impl LlmClient for NullLlmClient {
    async fn analyze(&self, _prompt: &str, _mode: PromptMode) -> Result<LlmResponse, CtpError> {
        Ok(LlmResponse {
            text: r#"{"pois":[],"relationships":[]}"#.to_string(),
            usage: TokenUsage::default(),
        })
    }
}
