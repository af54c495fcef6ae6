//! Confidence scoring and triangulation (§4.3): a deterministic fast-path
//! scorer and a six-agent slow-path consensus orchestrator.

pub mod cancellation;
pub mod scorer;
pub mod triangulation;

pub use cancellation::CancellationToken;
pub use scorer::{score, score_with_level, ConfidenceLevel, ScoringInput};
pub use triangulation::{TriangulationContext, TriangulationOrchestrator, TriangulationOutcome, CONSENSUS_THRESHOLD};
