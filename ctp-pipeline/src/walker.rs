//! `FsWalker` (§6 "Walker (consumed)"): the default single-node `FileWalker`,
//! grounded on `drift-analysis::scanner::walker`'s use of the `ignore`
//! crate. Sequential rather than `WalkParallel` — one process driving every
//! stage directly has no use for a channel-fed producer thread.

use std::path::Path;

use ctp_core::errors::CtpError;
use ctp_core::traits::{FileWalker, WalkedFile};

/// Default ignore patterns, mirrors the teacher's walker.
const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "__pycache__",
    ".pytest_cache",
    "coverage",
    "vendor",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
];

pub struct FsWalker {
    files: std::vec::IntoIter<WalkedFile>,
}

impl FsWalker {
    /// Walk `root` eagerly: `.gitignore`-aware, skips symlinks (so a
    /// symlink cycle can never make the walk loop), sorted for
    /// deterministic ingestion order.
    pub fn new(root: &Path) -> Result<Self, CtpError> {
        let mut builder = ignore::WalkBuilder::new(root);
        builder.hidden(false).git_ignore(true).git_global(true).git_exclude(true).follow_links(false);

        let mut overrides = ignore::overrides::OverrideBuilder::new(root);
        for pattern in DEFAULT_IGNORES {
            let _ = overrides.add(&format!("!{}/**", pattern));
            let _ = overrides.add(&format!("!{}", pattern));
        }
        if let Ok(built) = overrides.build() {
            builder.overrides(built);
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            files.push(WalkedFile {
                path: path.to_string_lossy().into_owned(),
                content_hash: blake3::hash(&bytes).to_hex().to_string(),
                size_bytes: bytes.len() as u64,
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Self { files: files.into_iter() })
    }
}

impl FileWalker for FsWalker {
    fn next_file(&mut self) -> Result<Option<WalkedFile>, CtpError> {
        Ok(self.files.next())
    }
}
