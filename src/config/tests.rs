use std::io::Write;

use super::*;

#[test]
fn defaults_match_service_contract() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.compiler.program, PathBuf::from("pdflatex"));
    assert_eq!(settings.compiler.timeout, Duration::from_secs(45));
    assert_eq!(settings.compiler.attempts.get(), 2);
    assert!(settings.compiler.work_root.is_none());
    assert!(settings.inspector.enabled);
    assert_eq!(settings.inspector.program, PathBuf::from("pdfinfo"));
    assert_eq!(settings.inspector.required_pages.get(), 1);
    assert_eq!(
        settings.server.max_request_bytes.get(),
        DEFAULT_MAX_REQUEST_BYTES
    );
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.compiler.attempts = Some(3);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        toolchain: ToolchainOverrides {
            compiler_attempts: Some(1),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.compiler.attempts.get(), 1);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.compiler.timeout_seconds = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "compiler.timeout_seconds",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.compiler.attempts = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "compiler.attempts",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.inspector.required_pages = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "inspector.required_pages",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "server.port",
            ..
        })
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["latex-compiler"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "latex-compiler",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--server-port",
        "9000",
        "--compiler-timeout-seconds",
        "30",
        "--inspector-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.server_port, Some(9000));
            assert_eq!(serve.overrides.toolchain.compiler_timeout_seconds, Some(30));
            assert_eq!(serve.overrides.toolchain.inspector_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_compile_arguments() {
    let args = CliArgs::parse_from([
        "latex-compiler",
        "compile",
        "--compiler-program",
        "/opt/texlive/bin/pdflatex",
        "resume.tex",
    ]);

    match args.command.expect("compile command") {
        Command::Compile(compile) => {
            assert_eq!(compile.input, PathBuf::from("resume.tex"));
            assert_eq!(compile.output_path(), PathBuf::from("resume.pdf"));
            assert_eq!(
                compile.toolchain.compiler_program,
                Some(PathBuf::from("/opt/texlive/bin/pdflatex"))
            );
        }
        _ => panic!("wrong command parsed"),
    }

    let args = CliArgs::parse_from(["latex-compiler", "compile", "cv.tex", "-o", "/tmp/out.pdf"]);
    match args.command.expect("compile command") {
        Command::Compile(compile) => {
            assert_eq!(compile.output_path(), PathBuf::from("/tmp/out.pdf"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn config_file_is_layered_under_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        "[compiler]\nattempts = 3\ntimeout_seconds = 20\n\n[inspector]\nrequired_pages = 2\n"
    )
    .expect("write config");

    let config_path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "latex-compiler",
        "--config-file",
        config_path.as_str(),
        "compile",
        "--compiler-attempts",
        "1",
        "cv.tex",
    ]);

    let settings = load(&args).expect("settings load");

    assert_eq!(settings.compiler.attempts.get(), 1);
    assert_eq!(settings.compiler.timeout, Duration::from_secs(20));
    assert_eq!(settings.inspector.required_pages.get(), 2);
}
