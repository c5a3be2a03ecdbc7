use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::domain::document::{ARTIFACT_FILE_NAME, LOG_FILE_NAME, SOURCE_FILE_NAME};

const WORKSPACE_PREFIX: &str = "latex-compile-";

/// Per-request scratch directory. The directory and everything the
/// compiler writes into it are removed when the workspace is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root`, or the system temp dir when `None`.
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.path().join(SOURCE_FILE_NAME)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.path().join(ARTIFACT_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join(LOG_FILE_NAME)
    }

    /// Write the markup verbatim as the workspace's source file.
    pub async fn stage(&self, markup: &str) -> io::Result<()> {
        tokio::fs::write(self.source_path(), markup.as_bytes()).await
    }
}
