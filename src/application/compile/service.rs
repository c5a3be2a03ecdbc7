use std::{
    io::ErrorKind,
    num::NonZeroU32,
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use bytes::Bytes;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::domain::document::{
    CompileRequest, CompiledDocument, Diagnostic, SOURCE_FILE_NAME, decode_dropping_invalid,
};

use super::{
    error::{CompileError, CompileStage},
    toolchain::{ArtifactInspector, CompilerRun, DocumentCompiler},
    workspace::Workspace,
};

const DEFAULT_ATTEMPTS: u32 = 2;
const DEFAULT_REQUIRED_PAGES: u32 = 1;

/// Knobs for a compilation run, resolved from settings at startup.
#[derive(Debug, Clone)]
pub struct CompilePolicy {
    /// Number of compiler passes run back to back for every request.
    pub attempts: NonZeroU32,
    /// Exact page count the artifact must have when an inspector is attached.
    pub required_pages: NonZeroU32,
    /// Parent directory for workspaces; the system temp dir when `None`.
    pub work_root: Option<PathBuf>,
}

impl Default for CompilePolicy {
    fn default() -> Self {
        Self {
            attempts: NonZeroU32::new(DEFAULT_ATTEMPTS).unwrap_or(NonZeroU32::MIN),
            required_pages: NonZeroU32::new(DEFAULT_REQUIRED_PAGES).unwrap_or(NonZeroU32::MIN),
            work_root: None,
        }
    }
}

impl From<&crate::config::Settings> for CompilePolicy {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            attempts: settings.compiler.attempts,
            required_pages: settings.inspector.required_pages,
            work_root: settings.compiler.work_root.clone(),
        }
    }
}

/// Turns LaTeX markup into a validated PDF.
///
/// Every call owns its workspace and child processes, so a single service
/// instance can be shared across concurrent requests.
pub struct CompileService {
    compiler: Arc<dyn DocumentCompiler>,
    inspector: Option<Arc<dyn ArtifactInspector>>,
    policy: CompilePolicy,
}

impl CompileService {
    pub fn new(compiler: Arc<dyn DocumentCompiler>, policy: CompilePolicy) -> Self {
        Self {
            compiler,
            inspector: None,
            policy,
        }
    }

    /// Enable page-count validation of produced artifacts.
    pub fn with_inspector(mut self, inspector: Arc<dyn ArtifactInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Validate `markup` and compile it.
    pub async fn compile(&self, markup: &str) -> Result<CompiledDocument, CompileError> {
        let started_at = Instant::now();
        let result = match CompileRequest::new(markup) {
            Ok(request) => self.compile_request(&request).await,
            Err(err) => Err(CompileError::from(err)),
        };
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        match &result {
            Ok(document) => {
                info!(
                    target = "application::compile",
                    op = "compile",
                    result = "success",
                    elapsed_ms,
                    pdf_bytes = document.bytes.len(),
                    pages = document.pages,
                    "Document compiled"
                );
                counter!("latex_compiler_compile_total", "outcome" => "success").increment(1);
            }
            Err(err) => {
                warn!(
                    target = "application::compile",
                    op = "compile",
                    result = "error",
                    elapsed_ms,
                    error_code = err.outcome(),
                    error = %err,
                    "Document compilation failed"
                );
                counter!("latex_compiler_compile_total", "outcome" => err.outcome()).increment(1);
            }
        }
        histogram!("latex_compiler_compile_ms").record(elapsed_ms as f64);

        result
    }

    async fn compile_request(
        &self,
        request: &CompileRequest,
    ) -> Result<CompiledDocument, CompileError> {
        let workspace = Workspace::create(self.policy.work_root.as_deref())?;
        workspace.stage(request.markup()).await?;
        debug!(
            target = "application::compile",
            workspace = %workspace.path().display(),
            markup_bytes = request.markup().len(),
            "Source staged"
        );

        for attempt in 1..=self.policy.attempts.get() {
            counter!("latex_compiler_compiler_runs_total").increment(1);
            match self.compiler.run(workspace.path(), SOURCE_FILE_NAME).await? {
                CompilerRun::Succeeded => {
                    debug!(target = "application::compile", attempt, "Compiler pass finished");
                }
                CompilerRun::Failed { exit_code, output } => {
                    let diagnostic = read_diagnostic(&workspace, &output).await;
                    return Err(CompileError::CompilationFailed {
                        attempt,
                        exit_code,
                        diagnostic,
                    });
                }
                CompilerRun::TimedOut { timeout } => {
                    return Err(CompileError::TimedOut {
                        stage: CompileStage::Compile,
                        timeout,
                    });
                }
            }
        }

        let artifact_path = workspace.artifact_path();
        if !tokio::fs::try_exists(&artifact_path).await? {
            return Err(CompileError::ArtifactMissing);
        }

        let pages = match &self.inspector {
            Some(inspector) => {
                let pages = inspector.page_count(&artifact_path).await?;
                let required = self.policy.required_pages.get();
                if pages != required {
                    return Err(CompileError::PageCountInvalid { pages, required });
                }
                Some(pages)
            }
            None => None,
        };

        let bytes = tokio::fs::read(&artifact_path).await?;
        Ok(CompiledDocument {
            bytes: Bytes::from(bytes),
            pages,
        })
    }
}

async fn read_diagnostic(workspace: &Workspace, output: &str) -> Diagnostic {
    match tokio::fs::read(workspace.log_path()).await {
        Ok(log) => Diagnostic::from_log(&decode_dropping_invalid(&log)),
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                warn!(
                    target = "application::compile",
                    error = %err,
                    "Failed to read compiler log; falling back to process output"
                );
            }
            Diagnostic::from_output(output)
        }
    }
}
