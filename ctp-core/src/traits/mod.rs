pub mod graph;
pub mod llm_client;
pub mod storage;
pub mod walker;

pub use graph::{GraphUpsertBatch, GraphUpsertOutcome, PropertyGraph};
pub use llm_client::{LlmClient, LlmResponse, PromptMode, TokenUsage};
pub use storage::{PipelineStorage, StorageStats};
pub use walker::{FileWalker, WalkedFile};
