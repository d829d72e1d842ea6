use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};

use convlog_core::runner::CommandRunner;
use convlog_core::{transcript, LogError, LogRequest};
use regex::Regex;
use tracing::{debug, warn};

use crate::workspace::MARKER_DIR;

/// Line in the CLI's stdout carrying the produced log's path.
static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Location:\s*(.+\.md)\s*$").unwrap());

/// Thin wrapper around the external logging CLI.
pub struct CliLogger {
    runner: Arc<dyn CommandRunner>,
    cli_path: String,
}

impl CliLogger {
    pub fn new(runner: Arc<dyn CommandRunner>, cli_path: impl Into<String>) -> Self {
        Self {
            runner,
            cli_path: cli_path.into(),
        }
    }

    /// Probe whether the logging CLI can be executed at all.
    pub async fn is_available(&self) -> bool {
        match self
            .runner
            .run(&self.cli_path, &["--version".to_string()], None)
            .await
        {
            Ok(output) => output.success(),
            Err(_) => false,
        }
    }

    /// Hand one conversation to the CLI.
    ///
    /// Renders the transcript, parks it in a temp file under the workspace
    /// marker directory, invokes `<cli> log conversation`, and recovers the
    /// produced log's path from stdout. The temp file is removed on every
    /// exit path; a failed removal is logged and never masks the primary
    /// result. No timeout is placed on the CLI, so a hung tool hangs this
    /// call.
    pub async fn log_conversation(
        &self,
        workspace_root: &Path,
        request: &LogRequest,
    ) -> Result<PathBuf, LogError> {
        let transcript = transcript::render(&request.messages);

        let tmp_dir = workspace_root.join(MARKER_DIR).join("tmp");
        tokio::fs::create_dir_all(&tmp_dir).await?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let tmp_file = tmp_dir.join(format!("transcript_{millis}.txt"));
        tokio::fs::write(&tmp_file, &transcript).await?;

        let args = build_log_args(&tmp_file, request);
        let result = self
            .runner
            .run(&self.cli_path, &args, Some(workspace_root))
            .await;

        if let Err(err) = tokio::fs::remove_file(&tmp_file).await {
            warn!(file = %tmp_file.display(), "failed to remove temp transcript: {err}");
        }

        let output = result.map_err(LogError::from)?;
        if !output.success() {
            return Err(LogError::ToolFailed {
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !output.stderr.trim().is_empty() {
            debug!("logging CLI stderr: {}", output.stderr.trim());
        }

        match LOCATION_RE.captures(&output.stdout) {
            Some(caps) => Ok(PathBuf::from(caps[1].trim())),
            None => Err(LogError::UnexpectedOutput),
        }
    }
}

fn build_log_args(transcript_file: &Path, request: &LogRequest) -> Vec<String> {
    let mut args = vec![
        "log".to_string(),
        "conversation".to_string(),
        "--context".to_string(),
        request.context.clone(),
        "--transcript".to_string(),
        transcript_file.to_string_lossy().into_owned(),
    ];

    if !request.decisions.is_empty() {
        args.push("--decisions".to_string());
        args.push(request.decisions.join(","));
    }
    if !request.action_items.is_empty() {
        args.push("--action-items".to_string());
        args.push(request.action_items.join(","));
    }
    if !request.files_modified.is_empty() {
        args.push("--files".to_string());
        args.push(request.files_modified.join(","));
    }
    if let Some(next_steps) = &request.next_steps {
        args.push("--next-steps".to_string());
        args.push(next_steps.clone());
    }

    args
}
