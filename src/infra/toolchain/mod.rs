//! Process-backed implementations of the compile pipeline's tool ports.

mod pdfinfo;
mod pdflatex;
mod process;

pub use pdfinfo::{PdfinfoInspector, parse_page_count};
pub use pdflatex::PdflatexCompiler;
pub use process::{ProcessError, ProcessOutput, run_with_timeout};
