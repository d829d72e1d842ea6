use crate::runner::RunnerError;

/// Failures surfaced by the logging pipeline. The caller's buffer is always
/// left intact when one of these comes back, so a later retry can attempt
/// the same flush again.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("logging CLI unavailable: {program}")]
    ToolUnavailable { program: String },
    #[error("logging CLI failed (status {status:?}): {stderr}")]
    ToolFailed { status: Option<i32>, stderr: String },
    #[error("logging CLI output did not contain a Location line")]
    UnexpectedOutput,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RunnerError> for LogError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::NotFound(program) => LogError::ToolUnavailable { program },
            RunnerError::Io(err) => LogError::Io(err),
        }
    }
}
