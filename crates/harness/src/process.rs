use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Runs an external CLI to completion, capturing stdout and stderr.
pub(crate) async fn run(binary: &str, dir: Option<&Path>, args: &[String]) -> std::io::Result<Output> {
    debug!("Running {} {}", binary, args.join(" "));
    let mut command = Command::new(binary);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    command.output().await
}

/// Diagnostic text for a failed invocation, surfaced verbatim in errors.
pub(crate) fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("exited with {}", output.status)
    } else {
        text
    }
}
