pub mod detection;

pub use detection::{detect_conflicts, overall_severity, Conflict, ConflictDimension};
