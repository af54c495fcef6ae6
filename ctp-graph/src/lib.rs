//! Integrity gate and bulk graph builder (§4.5): runs before any graph
//! write, repairs what it can, and bulk-loads VALIDATED relationships into
//! a `PropertyGraph` implementation in batches.

pub mod builder;
pub mod integrity;

pub use builder::{build_graph, BuildReport, BATCH_SIZE};
pub use integrity::{run_integrity_gate, IntegrityReport};
