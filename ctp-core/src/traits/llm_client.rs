//! `LlmClient` — the consumed LLM collaborator (§6). The pipeline's
//! worker pool calls this trait under `GLOBAL_LLM_CONCURRENCY` and treats
//! its errors per the §7 taxonomy (timeouts and rate limits are TRANSIENT).

use async_trait::async_trait;

use crate::errors::CtpError;

/// System-level analysis mode, mirrors `SourceMode` at the prompt layer:
/// batch analysis sees many files at once, individual sees one, and
/// triangulated is a sub-agent's focused re-analysis of one relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Batch,
    Individual,
    Triangulated,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Abstraction over the LLM backing the extraction and triangulation
/// stages. Implementations own their own retry/backoff up to
/// `WORKER_RETRIES` and must return within the caller-supplied deadline,
/// surfacing a timeout as `CtpError::Resource` (TRANSIENT, recoverable).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn analyze(&self, prompt: &str, mode: PromptMode) -> Result<LlmResponse, CtpError>;
}
