use std::{io, time::Duration};

use thiserror::Error;

use crate::domain::{document::Diagnostic, error::DomainError};

use super::toolchain::{InspectError, ToolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStage {
    Compile,
    Inspect,
}

impl CompileStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileStage::Compile => "compile",
            CompileStage::Inspect => "inspect",
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    InvalidInput(#[from] DomainError),
    #[error("compiler rejected the source on pass {attempt}")]
    CompilationFailed {
        attempt: u32,
        exit_code: Option<i32>,
        diagnostic: Diagnostic,
    },
    #[error("{} stage timed out after {}s", .stage.as_str(), .timeout.as_secs())]
    TimedOut {
        stage: CompileStage,
        timeout: Duration,
    },
    #[error("compiler reported success but produced no artifact")]
    ArtifactMissing,
    #[error("inspector output did not report a page count")]
    InspectionUnparseable { output: String },
    #[error("inspector exited with {exit_code:?}")]
    InspectionFailed {
        exit_code: Option<i32>,
        output: String,
    },
    #[error("document has {pages} pages, expected {required}")]
    PageCountInvalid { pages: u32, required: u32 },
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("workspace i/o failed: {0}")]
    Io(#[from] io::Error),
}

impl CompileError {
    /// Stable label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            CompileError::InvalidInput(_) => "invalid_input",
            CompileError::CompilationFailed { .. } => "compilation_failed",
            CompileError::TimedOut { .. } => "timeout",
            CompileError::ArtifactMissing => "artifact_missing",
            CompileError::InspectionUnparseable { .. } => "inspection_unparseable",
            CompileError::InspectionFailed { .. } => "inspection_failed",
            CompileError::PageCountInvalid { .. } => "page_count_invalid",
            CompileError::Tool(ToolError::Unavailable { .. }) => "tool_unavailable",
            CompileError::Tool(ToolError::Io { .. }) => "tool_failed",
            CompileError::Io(_) => "io_error",
        }
    }
}

impl From<InspectError> for CompileError {
    fn from(error: InspectError) -> Self {
        match error {
            InspectError::TimedOut { timeout } => CompileError::TimedOut {
                stage: CompileStage::Inspect,
                timeout,
            },
            InspectError::Failed { exit_code, output } => {
                CompileError::InspectionFailed { exit_code, output }
            }
            InspectError::Unparseable { output } => CompileError::InspectionUnparseable { output },
            InspectError::Tool(err) => CompileError::Tool(err),
        }
    }
}
