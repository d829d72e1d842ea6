use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Per-workspace configuration, read from `.convlog/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub user: String,
    /// Gates the conversation monitor; off by default.
    #[serde(default)]
    pub auto_log: bool,
    #[serde(default)]
    pub version: String,
    /// Command used to invoke the logging CLI.
    #[serde(default = "default_cli_path")]
    pub cli_path: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            user: String::new(),
            auto_log: false,
            version: String::new(),
            cli_path: default_cli_path(),
        }
    }
}

fn default_cli_path() -> String {
    "convlog".to_string()
}

/// Resolves the active workspace, if any.
pub trait WorkspaceLocator: Send + Sync {
    /// Root of the active workspace folder, or `None` when there is
    /// nowhere to log to.
    fn workspace_root(&self) -> Option<PathBuf>;

    /// Workspace configuration, or `None` when absent or unreadable.
    fn config(&self) -> Option<WorkspaceConfig>;
}

/// Payloadless activity callback.
pub type ActivityListener = Arc<dyn Fn() + Send + Sync>;

/// Host-supplied activity notifications. Both kinds only ever reset the
/// monitor's idle timer; they carry no payload.
pub trait ActivitySource: Send + Sync {
    /// Register a listener for generic file activity (created, removed,
    /// renamed files).
    fn on_file_activity(&self, listener: ActivityListener) -> Subscription;

    /// Register a listener for document edits.
    fn on_document_activity(&self, listener: ActivityListener) -> Subscription;
}

/// An `ActivitySource` that never fires. Useful when no host watcher is
/// available; the idle timer then only ever resets on recorded messages.
pub struct NullActivitySource;

impl ActivitySource for NullActivitySource {
    fn on_file_activity(&self, _listener: ActivityListener) -> Subscription {
        Subscription::empty()
    }

    fn on_document_activity(&self, _listener: ActivityListener) -> Subscription {
        Subscription::empty()
    }
}

/// Disposable listener registration. Dropping the handle unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
