use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::application::compile::{CompilerRun, DocumentCompiler, ToolError};

use super::process::{ProcessError, run_with_timeout};

/// Runs `pdflatex` in batch mode so it never waits on a terminal.
#[derive(Debug, Clone)]
pub struct PdflatexCompiler {
    program: PathBuf,
    timeout: Duration,
}

impl PdflatexCompiler {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl DocumentCompiler for PdflatexCompiler {
    async fn run(&self, workdir: &Path, source_file: &str) -> Result<CompilerRun, ToolError> {
        let started_at = Instant::now();
        let mut command = Command::new(&self.program);
        command
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(source_file)
            .current_dir(workdir);

        let output = match run_with_timeout(command, self.timeout).await {
            Ok(output) => output,
            Err(ProcessError::TimedOut { timeout, .. }) => {
                warn!(
                    target = "infra::toolchain::pdflatex",
                    op = "pdflatex::run",
                    result = "timeout",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    timeout_secs = timeout.as_secs(),
                    "pdflatex exceeded its time budget and was killed"
                );
                return Ok(CompilerRun::TimedOut { timeout });
            }
            Err(ProcessError::Spawn { program, source }) => {
                warn!(
                    target = "infra::toolchain::pdflatex",
                    op = "pdflatex::run",
                    result = "error",
                    error_code = "spawn_cli",
                    error = %source,
                    "Failed to spawn pdflatex"
                );
                return Err(if source.kind() == ErrorKind::NotFound {
                    ToolError::Unavailable { program, source }
                } else {
                    ToolError::Io { program, source }
                });
            }
            Err(ProcessError::Wait { program, source }) => {
                return Err(ToolError::Io { program, source });
            }
        };

        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        if output.status.success() {
            info!(
                target = "infra::toolchain::pdflatex",
                op = "pdflatex::run",
                result = "success",
                elapsed_ms,
                "pdflatex pass finished"
            );
            return Ok(CompilerRun::Succeeded);
        }

        let exit_code = output.status.code();
        warn!(
            target = "infra::toolchain::pdflatex",
            op = "pdflatex::run",
            result = "error",
            elapsed_ms,
            exit_code = exit_code.map(i64::from).unwrap_or(-1),
            error_code = "pdflatex",
            "pdflatex rejected the source"
        );
        Ok(CompilerRun::Failed {
            exit_code,
            output: output.output,
        })
    }
}
