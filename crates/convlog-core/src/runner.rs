use async_trait::async_trait;
use std::path::Path;

/// Captured result of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status code, if the process exited normally.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Process-invocation seam. The flush path only ever talks to this trait,
/// so tests can script outputs without spawning anything.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, wait for it to exit, and capture its
    /// output. `cwd` sets the working directory when given.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, RunnerError>;
}
