//! Transactional outbox publisher (§4.2): drains analysis results onto
//! the queue bus in priority order, creating PENDING relationships and
//! triangulation sessions as needed.

pub mod payloads;
pub mod publisher;

pub use payloads::{DirectoryFindingPayload, PoiBatchPayload, RelationshipFindingPayload};
pub use publisher::{DrainReport, OutboxPublisher};
