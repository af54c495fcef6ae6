//! `FileWalker` — the consumed filesystem collaborator (§6): a lazy,
//! restartable, symlink-loop-safe sequence of source files under the
//! target root.

use crate::errors::CtpError;

/// One discovered file, pre-hashed so `ctp-storage` can detect whether a
/// restart is re-ingesting unchanged content.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub path: String,
    pub content_hash: String,
    pub size_bytes: u64,
}

/// A finite, lazily-produced sequence of files under the target root.
/// Implementations must be safe to re-create from scratch after a crash
/// (no hidden cursor state outside what the caller persists) and must not
/// loop forever on a symlink cycle.
pub trait FileWalker: Send {
    /// Pull the next file, or `None` once the walk is exhausted.
    fn next_file(&mut self) -> Result<Option<WalkedFile>, CtpError>;
}

impl<I> FileWalker for I
where
    I: Iterator<Item = Result<WalkedFile, CtpError>> + Send,
{
    fn next_file(&mut self) -> Result<Option<WalkedFile>, CtpError> {
        self.next().transpose()
    }
}
