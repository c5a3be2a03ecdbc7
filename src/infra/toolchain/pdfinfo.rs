use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::application::compile::{ArtifactInspector, InspectError, ToolError};

use super::process::{ProcessError, run_with_timeout};

const PAGES_LABEL: &str = "pages";

/// Reads the page count of a PDF via `pdfinfo`.
#[derive(Debug, Clone)]
pub struct PdfinfoInspector {
    program: PathBuf,
    timeout: Duration,
}

impl PdfinfoInspector {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl ArtifactInspector for PdfinfoInspector {
    async fn page_count(&self, artifact: &Path) -> Result<u32, InspectError> {
        let started_at = Instant::now();
        let mut command = Command::new(&self.program);
        command.arg(artifact);
        if let Some(parent) = artifact.parent() {
            command.current_dir(parent);
        }

        let output = run_with_timeout(command, self.timeout)
            .await
            .map_err(|err| match err {
                ProcessError::TimedOut { timeout, .. } => InspectError::TimedOut { timeout },
                ProcessError::Spawn { program, source } if source.kind() == ErrorKind::NotFound => {
                    InspectError::Tool(ToolError::Unavailable { program, source })
                }
                ProcessError::Spawn { program, source } | ProcessError::Wait { program, source } => {
                    InspectError::Tool(ToolError::Io { program, source })
                }
            })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            warn!(
                target = "infra::toolchain::pdfinfo",
                op = "pdfinfo::page_count",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                "pdfinfo invocation failed"
            );
            return Err(InspectError::Failed {
                exit_code,
                output: output.output,
            });
        }

        match parse_page_count(&output.output) {
            Some(pages) => {
                debug!(
                    target = "infra::toolchain::pdfinfo",
                    op = "pdfinfo::page_count",
                    result = "success",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    pages,
                    "PDF inspected"
                );
                Ok(pages)
            }
            None => Err(InspectError::Unparseable {
                output: output.output,
            }),
        }
    }
}

/// Find the first `Pages:` line (label matched case-insensitively) and parse its value.
pub fn parse_page_count(output: &str) -> Option<u32> {
    output.lines().find_map(|line| {
        let (label, value) = line.split_once(':')?;
        if !label.trim().eq_ignore_ascii_case(PAGES_LABEL) {
            return None;
        }
        value.trim().parse().ok()
    })
}
