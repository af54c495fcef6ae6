pub mod ctp_error;
pub mod error_code;
pub mod queue_error;
pub mod storage_error;
pub mod taxonomy;

pub use ctp_error::CtpError;
pub use queue_error::QueueError;
pub use storage_error::StorageError;
pub use taxonomy::{ErrorContext, ErrorTaxonomy};
