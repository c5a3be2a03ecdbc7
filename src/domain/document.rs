use std::fmt;

use bytes::Bytes;

use super::error::DomainError;

/// File the markup is staged into inside a workspace.
pub const SOURCE_FILE_NAME: &str = "main.tex";
/// Artifact the compiler is expected to leave behind on success.
pub const ARTIFACT_FILE_NAME: &str = "main.pdf";
/// Compiler log consulted for diagnostics on failure.
pub const LOG_FILE_NAME: &str = "main.log";

pub const ARTIFACT_CONTENT_TYPE: &str = "application/pdf";
pub const DOWNLOAD_FILE_NAME: &str = "resume.pdf";

/// Upper bound, in characters, for diagnostics returned to callers.
pub const DIAGNOSTIC_TAIL_CHARS: usize = 4000;

/// A validated compilation request. The markup is guaranteed to contain
/// at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    markup: String,
}

impl CompileRequest {
    pub fn new(markup: impl Into<String>) -> Result<Self, DomainError> {
        let markup = markup.into();
        if markup.trim().is_empty() {
            return Err(DomainError::validation("Missing 'latex' field"));
        }
        Ok(Self { markup })
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// The PDF produced for a successful request.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub bytes: Bytes,
    /// Page count reported by the inspector; `None` when inspection is disabled.
    pub pages: Option<u32>,
}

impl CompiledDocument {
    pub fn content_type(&self) -> &'static str {
        ARTIFACT_CONTENT_TYPE
    }

    pub fn file_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.file_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSource {
    Log,
    Output,
}

impl DiagnosticSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticSource::Log => "log",
            DiagnosticSource::Output => "output",
        }
    }
}

/// Truncated compiler diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: DiagnosticSource,
    pub text: String,
}

impl Diagnostic {
    pub fn from_log(log: &str) -> Self {
        Self {
            source: DiagnosticSource::Log,
            text: tail_chars(log, DIAGNOSTIC_TAIL_CHARS).to_string(),
        }
    }

    pub fn from_output(output: &str) -> Self {
        Self {
            source: DiagnosticSource::Output,
            text: tail_chars(output, DIAGNOSTIC_TAIL_CHARS).to_string(),
        }
    }

    /// Human-readable rendering used in error payloads.
    pub fn render(&self) -> String {
        match self.source {
            DiagnosticSource::Log => format!("LaTeX compilation failed. Log tail:\n{}", self.text),
            DiagnosticSource::Output => {
                format!("LaTeX compilation failed. Output:\n{}", self.text)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns the last `limit` characters of `text` (all of it when shorter).
/// Decode `bytes` as UTF-8, dropping any invalid sequences.
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

pub fn tail_chars(text: &str, limit: usize) -> &str {
    if limit == 0 {
        return "";
    }
    match text.char_indices().rev().nth(limit - 1) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}
