use std::{process, sync::Arc};

use latex_compiler::{
    application::{
        compile::{CompileError, CompilePolicy, CompileService},
        error::AppError,
    },
    config::{self, CompileArgs, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        toolchain::{PdfinfoInspector, PdflatexCompiler},
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if let AppError::Compile(CompileError::CompilationFailed { diagnostic, .. }) = error {
        eprintln!("{}", diagnostic.render());
    }

    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Compile(args) => run_compile(settings, args).await,
    }
}

fn build_compile_service(settings: &Settings) -> CompileService {
    let compiler = PdflatexCompiler::new(
        settings.compiler.program.clone(),
        settings.compiler.timeout,
    );
    let service = CompileService::new(Arc::new(compiler), CompilePolicy::from(settings));

    if settings.inspector.enabled {
        let inspector = PdfinfoInspector::new(
            settings.inspector.program.clone(),
            settings.inspector.timeout,
        );
        service.with_inspector(Arc::new(inspector))
    } else {
        service
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let service = Arc::new(build_compile_service(&settings));
    let body_limit = usize::try_from(settings.server.max_request_bytes.get()).map_err(|_| {
        AppError::from(InfraError::configuration(
            "server.max_request_bytes exceeds the platform address space",
        ))
    })?;
    let router = http::build_router(HttpState::new(service), body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "latex_compiler::serve",
        addr = %settings.server.addr,
        compiler = %settings.compiler.program.display(),
        attempts = settings.compiler.attempts.get(),
        inspector_enabled = settings.inspector.enabled,
        "Listening for compile requests"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "latex_compiler::serve", "Server stopped");
    Ok(())
}

async fn run_compile(settings: Settings, args: CompileArgs) -> Result<(), AppError> {
    let service = build_compile_service(&settings);
    let markup = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let document = service.compile(&markup).await?;

    let output = args.output_path();
    tokio::fs::write(&output, &document.bytes)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "latex_compiler::compile",
        input = %args.input.display(),
        output = %output.display(),
        pdf_bytes = document.bytes.len(),
        "PDF written"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(target = "latex_compiler::serve", "Shutdown signal received");
}
