pub mod evidence;
pub mod identifiers;
pub mod outbox;
pub mod poi;
pub mod relationship;
pub mod run;
pub mod triangulation;

pub use evidence::{EvidencePayload, RelationshipEvidence, SourceMode};
pub use outbox::{OutboxEvent, OutboxEventKind};
pub use poi::{Poi, PoiType};
pub use relationship::{compute_evidence_hash, Relationship, RelationshipStatus, RelationshipType};
pub use run::{Run, SourceFile};
pub use triangulation::{AgentKind, SessionStatus, SubAgentAnalysis, TriangulationSession};
