use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use convlog_core::runner::{CommandOutput, CommandRunner, RunnerError};
use tokio::process::Command;
use tracing::debug;

/// `CommandRunner` backed by real child processes.
#[derive(Debug, Default, Clone)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, RunnerError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(program, ?args, "spawning external command");
        let output = cmd.output().await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RunnerError::NotFound(program.to_string())
            } else {
                RunnerError::Io(err)
            }
        })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
