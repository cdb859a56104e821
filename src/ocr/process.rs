//! Run an external recognizer: PNG bytes on stdin, text on stdout.

use super::RecognitionError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Spawn `program`, feed it `input` and collect stdout.
///
/// Stdin is written while stdout and stderr are drained, so a child that
/// talks before it reads cannot fill a pipe and stall. The child is killed
/// when `timeout` expires.
pub(super) async fn run_with_stdin(
    program: &Path,
    args: &[String],
    input: &[u8],
    timeout: Duration,
) -> Result<String, RecognitionError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdin = child.stdin.take();
    let feed = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(input).await?;
            // Dropping stdin closes the pipe so the child sees EOF.
        }
        Ok::<(), std::io::Error>(())
    };

    let run = async { tokio::join!(feed, child.wait_with_output()) };
    let (fed, output) = tokio::time::timeout(timeout, run).await.map_err(|_| {
        log::warn!(
            "[OCR] {} killed after {}ms",
            program.display(),
            timeout.as_millis()
        );
        RecognitionError::Timeout(timeout.as_secs())
    })?;

    let output = output?;
    if let Err(e) = fed {
        // A child that exits without reading its input closes the pipe early.
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }

    if !output.status.success() {
        return Err(RecognitionError::Process {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).replace('\x0c', ""))
}
