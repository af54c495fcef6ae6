//! # ctp-core
//!
//! Foundation crate for the Cognitive Triangulation Pipeline.
//! Defines domain types, error taxonomy, config, storage/graph traits, and
//! telemetry. Every other crate in the workspace depends on this.

#![allow(dead_code)]

pub mod config;
pub mod errors;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use config::PipelineConfig;
pub use errors::{error_code::CtpErrorCode, CtpError};
pub use types::identifiers::RunId;
