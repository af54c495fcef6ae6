//! Orchestrator library for the Cognitive Triangulation Pipeline: wires
//! the queue bus, outbox publisher, confidence scorer, triangulation and
//! validation orchestrators, and graph builder into one end-to-end run.

pub mod extraction;
pub mod health;
pub mod llm;
pub mod orchestrator;
pub mod report;
pub mod walker;

pub use orchestrator::Orchestrator;
pub use report::RunReport;
