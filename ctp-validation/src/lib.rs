//! Advanced validation and conflict resolution (§4.4): reconciles the same
//! logical relationship observed under different analysis modes.

pub mod cache;
pub mod candidate;
pub mod comparison;
pub mod conflict;
pub mod decision;
pub mod evidence;
pub mod pipeline;
pub mod pre_validation;
pub mod resolution;

pub use candidate::{RelationshipCandidate, Scope};
pub use decision::Decision;
pub use pipeline::{ValidationOutcome, ValidationPipeline};
