use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::compile::{CompileError, CompileStage, ToolError};
use crate::application::error::ErrorReport;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const COMPILATION_FAILED: &str = "compilation_failed";
    pub const PAGE_COUNT_INVALID: &str = "page_count_invalid";
    pub const TIMEOUT: &str = "timeout";
    pub const ARTIFACT_MISSING: &str = "artifact_missing";
    pub const INSPECTION_FAILED: &str = "inspection_failed";
    pub const TOOL_UNAVAILABLE: &str = "tool_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    detail: Option<String>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        detail: Option<String>,
    ) -> Self {
        let report = ErrorReport::from_message(
            "infra::http::compile",
            status,
            format!("{code}: {}", detail.as_deref().unwrap_or(message)),
        );
        Self {
            status,
            code,
            message,
            detail,
            report,
        }
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Missing 'latex' field",
            Some(detail.into()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn with_report(mut self, error: &CompileError) -> Self {
        self.report = ErrorReport::from_error("infra::http::compile", self.status, error);
        self
    }
}

impl From<CompileError> for ApiError {
    fn from(error: CompileError) -> Self {
        let api_error = match &error {
            CompileError::InvalidInput(err) => ApiError::invalid_input(err.to_string()),
            CompileError::CompilationFailed { diagnostic, .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::COMPILATION_FAILED,
                "LaTeX compilation failed",
                Some(diagnostic.render()),
            ),
            CompileError::PageCountInvalid { pages, required } => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::PAGE_COUNT_INVALID,
                "PDF has the wrong number of pages",
                Some(format!("PDF must be exactly {required} page(s), got {pages}")),
            ),
            CompileError::TimedOut { stage, timeout } => ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                codes::TIMEOUT,
                match stage {
                    CompileStage::Compile => "Compilation timeout",
                    CompileStage::Inspect => "PDF inspection timeout",
                },
                Some(format!("exceeded {}s", timeout.as_secs())),
            ),
            CompileError::ArtifactMissing => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::ARTIFACT_MISSING,
                "PDF not generated",
                None,
            ),
            CompileError::InspectionUnparseable { .. } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INSPECTION_FAILED,
                "Could not determine PDF page count",
                None,
            ),
            CompileError::InspectionFailed { .. } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INSPECTION_FAILED,
                "PDF inspection failed",
                None,
            ),
            CompileError::Tool(ToolError::Unavailable { .. }) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::TOOL_UNAVAILABLE,
                "Compiler toolchain unavailable",
                None,
            ),
            CompileError::Tool(ToolError::Io { .. }) | CompileError::Io(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "Internal server error",
                None,
            ),
        };
        api_error.with_report(&error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                detail: self.detail,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        self.report.attach(&mut response);
        response
    }
}
