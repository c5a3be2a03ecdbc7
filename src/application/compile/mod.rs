//! The compile pipeline: stage markup, run the compiler, validate the PDF.

mod error;
mod service;
mod toolchain;
mod workspace;

pub use error::{CompileError, CompileStage};
pub use service::{CompilePolicy, CompileService};
pub use toolchain::{ArtifactInspector, CompilerRun, DocumentCompiler, InspectError, ToolError};
pub use workspace::Workspace;
