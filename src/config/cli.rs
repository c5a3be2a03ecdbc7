use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the latex-compiler binary.
#[derive(Debug, Parser)]
#[command(name = "latex-compiler", version, about = "LaTeX to PDF compilation service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "LATEX_COMPILER_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Compile a single LaTeX file to PDF without starting the server.
    Compile(CompileArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ToolchainOverrides {
    /// Override the compiler executable.
    #[arg(long = "compiler-program", value_name = "PATH")]
    pub compiler_program: Option<PathBuf>,

    /// Override the per-pass compiler timeout.
    #[arg(long = "compiler-timeout-seconds", value_name = "SECONDS")]
    pub compiler_timeout_seconds: Option<u64>,

    /// Override the number of compiler passes per request.
    #[arg(long = "compiler-attempts", value_name = "COUNT")]
    pub compiler_attempts: Option<u64>,

    /// Override the parent directory for per-request workspaces.
    #[arg(long = "compiler-work-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub compiler_work_root: Option<PathBuf>,

    /// Toggle page-count inspection of produced PDFs.
    #[arg(
        long = "inspector-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub inspector_enabled: Option<bool>,

    /// Override the inspector executable.
    #[arg(long = "inspector-program", value_name = "PATH")]
    pub inspector_program: Option<PathBuf>,

    /// Override the inspector timeout.
    #[arg(long = "inspector-timeout-seconds", value_name = "SECONDS")]
    pub inspector_timeout_seconds: Option<u64>,

    /// Override the exact page count required of produced PDFs.
    #[arg(long = "inspector-required-pages", value_name = "COUNT")]
    pub inspector_required_pages: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub toolchain: ToolchainOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the maximum request body size in bytes.
    #[arg(long = "server-max-request-bytes", value_name = "BYTES")]
    pub server_max_request_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct CompileArgs {
    #[command(flatten)]
    pub toolchain: ToolchainOverrides,

    /// LaTeX source file to compile.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Where to write the PDF; defaults to INPUT with a `.pdf` extension.
    #[arg(long, short, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

impl CompileArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("pdf"))
    }
}
