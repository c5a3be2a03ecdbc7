//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{CliArgs, Command, CompileArgs, ServeArgs, ServeOverrides, ToolchainOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "latex-compiler";
const ENV_PREFIX: &str = "LATEX_COMPILER";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_REQUEST_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_COMPILER_PROGRAM: &str = "pdflatex";
const DEFAULT_COMPILER_TIMEOUT_SECS: u64 = 45;
const DEFAULT_COMPILER_ATTEMPTS: u64 = 2;
const DEFAULT_INSPECTOR_PROGRAM: &str = "pdfinfo";
const DEFAULT_INSPECTOR_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUIRED_PAGES: u64 = 1;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub compiler: CompilerSettings,
    pub inspector: InspectorSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CompilerSettings {
    pub program: PathBuf,
    pub timeout: Duration,
    pub attempts: NonZeroU32,
    pub work_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct InspectorSettings {
    pub enabled: bool,
    pub program: PathBuf,
    pub timeout: Duration,
    pub required_pages: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Compile(args)) => raw.apply_toolchain_overrides(&args.toolchain),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    compiler: RawCompilerSettings,
    inspector: RawInspectorSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(bytes) = overrides.server_max_request_bytes {
            self.server.max_request_bytes = Some(bytes);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        self.apply_toolchain_overrides(&overrides.toolchain);
    }

    fn apply_toolchain_overrides(&mut self, overrides: &ToolchainOverrides) {
        if let Some(program) = overrides.compiler_program.as_ref() {
            self.compiler.program = Some(program.clone());
        }
        if let Some(seconds) = overrides.compiler_timeout_seconds {
            self.compiler.timeout_seconds = Some(seconds);
        }
        if let Some(attempts) = overrides.compiler_attempts {
            self.compiler.attempts = Some(attempts);
        }
        if let Some(root) = overrides.compiler_work_root.as_ref() {
            self.compiler.work_root = Some(root.clone());
        }
        if let Some(enabled) = overrides.inspector_enabled {
            self.inspector.enabled = Some(enabled);
        }
        if let Some(program) = overrides.inspector_program.as_ref() {
            self.inspector.program = Some(program.clone());
        }
        if let Some(seconds) = overrides.inspector_timeout_seconds {
            self.inspector.timeout_seconds = Some(seconds);
        }
        if let Some(pages) = overrides.inspector_required_pages {
            self.inspector.required_pages = Some(pages);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            compiler,
            inspector,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let compiler = build_compiler_settings(compiler)?;
        let inspector = build_inspector_settings(inspector)?;

        Ok(Self {
            server,
            logging,
            compiler,
            inspector,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let max_request_bytes = NonZeroU64::new(
        server
            .max_request_bytes
            .unwrap_or(DEFAULT_MAX_REQUEST_BYTES),
    )
    .ok_or_else(|| LoadError::invalid("server.max_request_bytes", "must be greater than zero"))?;

    Ok(ServerSettings {
        addr,
        max_request_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_compiler_settings(compiler: RawCompilerSettings) -> Result<CompilerSettings, LoadError> {
    let program = compiler
        .program
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPILER_PROGRAM));
    if program.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "compiler.program",
            "path must not be empty",
        ));
    }

    let timeout = timeout_secs(
        compiler
            .timeout_seconds
            .unwrap_or(DEFAULT_COMPILER_TIMEOUT_SECS),
        "compiler.timeout_seconds",
    )?;

    let attempts = non_zero_u32(
        compiler.attempts.unwrap_or(DEFAULT_COMPILER_ATTEMPTS),
        "compiler.attempts",
    )?;

    let work_root = compiler
        .work_root
        .filter(|root| !root.as_os_str().is_empty());

    Ok(CompilerSettings {
        program,
        timeout,
        attempts,
        work_root,
    })
}

fn build_inspector_settings(
    inspector: RawInspectorSettings,
) -> Result<InspectorSettings, LoadError> {
    let program = inspector
        .program
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INSPECTOR_PROGRAM));
    if program.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "inspector.program",
            "path must not be empty",
        ));
    }

    let timeout = timeout_secs(
        inspector
            .timeout_seconds
            .unwrap_or(DEFAULT_INSPECTOR_TIMEOUT_SECS),
        "inspector.timeout_seconds",
    )?;

    let required_pages = non_zero_u32(
        inspector.required_pages.unwrap_or(DEFAULT_REQUIRED_PAGES),
        "inspector.required_pages",
    )?;

    Ok(InspectorSettings {
        enabled: inspector.enabled.unwrap_or(true),
        program,
        timeout,
        required_pages,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCompilerSettings {
    program: Option<PathBuf>,
    timeout_seconds: Option<u64>,
    attempts: Option<u64>,
    work_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawInspectorSettings {
    enabled: Option<bool>,
    program: Option<PathBuf>,
    timeout_seconds: Option<u64>,
    required_pages: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn timeout_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
