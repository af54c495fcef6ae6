//! Shared fakes for workspace tests: an in-memory file walker, LLM client,
//! and property graph, so crate-level tests never touch the filesystem,
//! network, or a real graph database.

pub mod graph;
pub mod llm_client;
pub mod walker;

pub use graph::InMemoryGraph;
pub use llm_client::{FailingLlmClient, FakeLlmClient};
pub use walker::FakeWalker;
