use ctp_core::errors::CtpError;
use ctp_core::traits::{FileWalker, WalkedFile};

/// A `FileWalker` over an in-memory list of files, for tests that don't
/// want to touch the real filesystem.
pub struct FakeWalker {
    files: std::vec::IntoIter<WalkedFile>,
}

impl FakeWalker {
    pub fn new(files: Vec<WalkedFile>) -> Self {
        Self { files: files.into_iter() }
    }

    pub fn from_paths(paths: &[&str]) -> Self {
        let files = paths
            .iter()
            .map(|p| WalkedFile {
                path: p.to_string(),
                content_hash: blake3::hash(p.as_bytes()).to_hex().to_string(),
                size_bytes: p.len() as u64,
            })
            .collect();
        Self::new(files)
    }
}

impl FileWalker for FakeWalker {
    fn next_file(&mut self) -> Result<Option<WalkedFile>, CtpError> {
        Ok(self.files.next())
    }
}
