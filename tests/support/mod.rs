#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use latex_compiler::{
    application::compile::{
        ArtifactInspector, CompilePolicy, CompileService, CompilerRun, DocumentCompiler,
        InspectError, ToolError,
    },
    infra::http::{HttpState, build_router},
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PDF_HEADER: &str = "%PDF-1.5\n";

/// Markup-driven stand-in for pdflatex: `FAIL` writes a long log and fails,
/// `HANG` times out, `NOPDF` succeeds without output, `NOTOOL` behaves like a
/// missing binary, anything else becomes a "PDF" whose body is the markup itself.
#[derive(Default)]
pub struct FakeCompiler {
    calls: AtomicUsize,
}

impl FakeCompiler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn failure_log() -> String {
    format!(
        "This is pdfTeX, Version 3.141592653\n{}! Undefined control sequence.\nl.3 \\fail\n",
        "(./main.tex [loading packages]) ".repeat(200)
    )
}

#[async_trait]
impl DocumentCompiler for FakeCompiler {
    async fn run(&self, workdir: &Path, source_file: &str) -> Result<CompilerRun, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let markup = tokio::fs::read_to_string(workdir.join(source_file))
            .await
            .map_err(|source| ToolError::Io {
                program: "fake".into(),
                source,
            })?;

        if markup.contains("FAIL") {
            tokio::fs::write(workdir.join("main.log"), failure_log())
                .await
                .expect("write log");
            return Ok(CompilerRun::Failed {
                exit_code: Some(1),
                output: "see main.log".into(),
            });
        }
        if markup.contains("HANG") {
            return Ok(CompilerRun::TimedOut {
                timeout: Duration::from_secs(45),
            });
        }
        if markup.contains("NOTOOL") {
            return Err(ToolError::Unavailable {
                program: "pdflatex".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        if markup.contains("NOPDF") {
            return Ok(CompilerRun::Succeeded);
        }

        tokio::fs::write(workdir.join("main.pdf"), format!("{PDF_HEADER}{markup}"))
            .await
            .expect("write pdf");
        Ok(CompilerRun::Succeeded)
    }
}

/// Counts `\newpage` in the artifact to decide how many pages it has.
#[derive(Default)]
pub struct FakeInspector;

#[async_trait]
impl ArtifactInspector for FakeInspector {
    async fn page_count(&self, artifact: &Path) -> Result<u32, InspectError> {
        let body = tokio::fs::read_to_string(artifact)
            .await
            .map_err(|source| {
                InspectError::Tool(ToolError::Io {
                    program: "fake".into(),
                    source,
                })
            })?;
        Ok(body.matches("\\newpage").count() as u32 + 1)
    }
}

pub struct Harness {
    pub router: Router,
    pub compiler: Arc<FakeCompiler>,
    pub work_root: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let work_root = TempDir::new().expect("work root");
        let compiler = Arc::new(FakeCompiler::default());
        let policy = CompilePolicy {
            work_root: Some(work_root.path().to_path_buf()),
            ..CompilePolicy::default()
        };
        let service = CompileService::new(compiler.clone(), policy)
            .with_inspector(Arc::new(FakeInspector));
        let router = build_router(HttpState::new(Arc::new(service)), 1024 * 1024);
        Self {
            router,
            compiler,
            work_root,
        }
    }

    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.work_root.path())
            .expect("list work root")
            .count()
    }
}

pub fn compile_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/compile")
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request should build")
}

pub fn latex_request(latex: &str) -> Request<Body> {
    compile_request(serde_json::json!({ "latex": latex }).to_string())
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}
