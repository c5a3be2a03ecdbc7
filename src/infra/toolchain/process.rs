use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// Captured stdout and stderr interleaved in emit order, decoded lossily.
    pub output: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` did not finish within {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("failed to collect output of `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Run `command` with stdin closed and output captured, killing it if it
/// outlives `timeout`.
pub async fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();

    // Both streams share one file description, so writes land in emit order.
    let mut capture = tempfile::tempfile().map_err(wait_error(&program))?;
    let stdout = capture.try_clone().map_err(wait_error(&program))?;
    let stderr = capture.try_clone().map_err(wait_error(&program))?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    // Dropping the child on timeout kills it.
    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(source)) => return Err(wait_error(&program)(source)),
        Err(_) => return Err(ProcessError::TimedOut { program, timeout }),
    };

    let output = read_capture(&mut capture).map_err(wait_error(&program))?;
    Ok(ProcessOutput {
        status,
        output: String::from_utf8_lossy(&output).into_owned(),
    })
}

fn wait_error(program: &str) -> impl FnOnce(io::Error) -> ProcessError {
    let program = program.to_string();
    move |source| ProcessError::Wait { program, source }
}

fn read_capture(capture: &mut File) -> io::Result<Vec<u8>> {
    capture.seek(SeekFrom::Start(0))?;
    let mut output = Vec::new();
    capture.read_to_end(&mut output)?;
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use tempfile::TempDir;

    use super::*;
    use crate::infra::toolchain::testing::write_script;

    #[tokio::test]
    async fn interleaves_stdout_and_stderr_in_emit_order() {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg("echo first; echo oops >&2; echo last; exit 3");

        let output = run_with_timeout(command, Duration::from_secs(5))
            .await
            .expect("process ran");

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.output, "first\noops\nlast\n");
    }

    #[tokio::test]
    async fn stdin_is_closed() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("cat; echo done");

        let output = run_with_timeout(command, Duration::from_secs(5))
            .await
            .expect("process must not block on stdin");

        assert!(output.status.success());
        assert_eq!(output.output, "done\n");
    }

    #[tokio::test]
    async fn kills_process_after_timeout() {
        let dir = TempDir::new().expect("temp dir");
        let script = dir.path().join("slow");
        let marker = dir.path().join("finished");
        write_script(
            &script,
            &format!(
                "#!/bin/sh\nsleep 2\ntouch \"{}\"\n",
                marker.display()
            ),
        );

        let started_at = Instant::now();
        let err = run_with_timeout(Command::new(&script), Duration::from_millis(200))
            .await
            .expect_err("must time out");

        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started_at.elapsed() < Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists(), "timed out process kept running");
    }

    #[tokio::test]
    async fn reports_missing_program() {
        let err = run_with_timeout(
            Command::new("/nonexistent/latex-compiler-test-binary"),
            Duration::from_secs(1),
        )
        .await
        .expect_err("spawn must fail");

        match err {
            ProcessError::Spawn { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
