use std::{io, path::Path, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

/// Result of a single compiler pass that ran to completion or was cut off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerRun {
    Succeeded,
    Failed {
        exit_code: Option<i32>,
        /// Captured stdout and stderr in emit order.
        output: String,
    },
    TimedOut {
        timeout: Duration,
    },
}

/// Failures to run a tool at all, as opposed to the tool reporting an error.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{program}` is not available: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("inspector timed out after {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },
    #[error("inspector exited with {exit_code:?}: {output}")]
    Failed {
        exit_code: Option<i32>,
        output: String,
    },
    #[error("inspector output did not report a page count")]
    Unparseable { output: String },
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Runs the external document compiler against a staged source file.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    /// Compile `source_file` (relative to `workdir`) with `workdir` as the
    /// process working directory.
    async fn run(&self, workdir: &Path, source_file: &str) -> Result<CompilerRun, ToolError>;
}

/// Extracts structural facts from a produced artifact.
#[async_trait]
pub trait ArtifactInspector: Send + Sync {
    async fn page_count(&self, artifact: &Path) -> Result<u32, InspectError>;
}
