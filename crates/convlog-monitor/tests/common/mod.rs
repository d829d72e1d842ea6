#![allow(dead_code)] // not every test binary uses every helper

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use convlog_core::host::{
    ActivityListener, ActivitySource, Subscription, WorkspaceConfig, WorkspaceLocator,
};
use convlog_core::runner::{CommandOutput, CommandRunner, RunnerError};
use convlog_monitor::{CliLogger, ConversationMonitor, MARKER_DIR};
use tempfile::TempDir;

pub enum MockResponse {
    Success(String),
    Failure(i32, String),
    NotFound,
}

/// Scripted `CommandRunner` recording every invocation, including the
/// transcript file content as it existed at invocation time.
pub struct MockRunner {
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
    pub transcripts: Mutex<Vec<String>>,
    response: Mutex<MockResponse>,
    delay: Option<Duration>,
}

impl MockRunner {
    pub fn success(log_path: &str) -> Arc<Self> {
        Self::with_response(MockResponse::Success(format!("Location: {log_path}\n")))
    }

    pub fn failure(status: i32, stderr: &str) -> Arc<Self> {
        Self::with_response(MockResponse::Failure(status, stderr.to_string()))
    }

    pub fn not_found() -> Arc<Self> {
        Self::with_response(MockResponse::NotFound)
    }

    pub fn with_response(response: MockResponse) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            transcripts: Mutex::new(Vec::new()),
            response: Mutex::new(response),
            delay: None,
        })
    }

    /// A successful runner that sleeps before answering, to keep a flush
    /// in flight while the test does something else.
    pub fn slow_success(log_path: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            transcripts: Mutex::new(Vec::new()),
            response: Mutex::new(MockResponse::Success(format!("Location: {log_path}\n"))),
            delay: Some(delay),
        })
    }

    pub fn set_response(&self, response: MockResponse) {
        *self.response.lock().unwrap() = response;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Value of the given flag in the recorded invocation at `index`.
    pub fn flag_value(&self, index: usize, flag: &str) -> Option<String> {
        let calls = self.calls.lock().unwrap();
        let (_, args) = calls.get(index)?;
        let pos = args.iter().position(|a| a == flag)?;
        args.get(pos + 1).cloned()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _cwd: Option<&Path>,
    ) -> Result<CommandOutput, RunnerError> {
        if let Some(pos) = args.iter().position(|a| a == "--transcript") {
            if let Some(file) = args.get(pos + 1) {
                if let Ok(content) = std::fs::read_to_string(file) {
                    self.transcripts.lock().unwrap().push(content);
                }
            }
        }
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.response.lock().unwrap();
        match &*response {
            MockResponse::Success(stdout) => Ok(CommandOutput {
                status: Some(0),
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            MockResponse::Failure(status, stderr) => Ok(CommandOutput {
                status: Some(*status),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            MockResponse::NotFound => Err(RunnerError::NotFound(program.to_string())),
        }
    }
}

/// `ActivitySource` with countable registrations and manual firing.
pub struct MockActivity {
    listeners: Arc<Mutex<Vec<(u64, ActivityListener)>>>,
    next_id: AtomicU64,
}

impl MockActivity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Invoke every registered listener once.
    pub fn fire(&self) {
        let listeners: Vec<ActivityListener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn register(&self, listener: ActivityListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((id, listener));

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            listeners.lock().unwrap().retain(|(entry, _)| *entry != id);
        })
    }
}

impl ActivitySource for MockActivity {
    fn on_file_activity(&self, listener: ActivityListener) -> Subscription {
        self.register(listener)
    }

    fn on_document_activity(&self, listener: ActivityListener) -> Subscription {
        self.register(listener)
    }
}

/// A locator with a fixed answer, independent of the filesystem.
pub struct FixedLocator {
    pub root: Option<PathBuf>,
    pub config: Option<WorkspaceConfig>,
}

impl WorkspaceLocator for FixedLocator {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn config(&self) -> Option<WorkspaceConfig> {
        self.config.clone()
    }
}

/// Temp workspace with a `.convlog` marker and config.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn enabled() -> Self {
        Self::with_auto_log(true)
    }

    pub fn disabled() -> Self {
        Self::with_auto_log(false)
    }

    fn with_auto_log(auto_log: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(MARKER_DIR);
        std::fs::create_dir(&marker).unwrap();
        std::fs::write(
            marker.join("config.json"),
            format!(r#"{{"project": "test", "user": "tester", "auto_log": {auto_log}}}"#),
        )
        .unwrap();
        Self { dir }
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.dir.path().join(MARKER_DIR).join("tmp")
    }

    pub fn locator(&self) -> Arc<convlog_monitor::DirWorkspace> {
        Arc::new(convlog_monitor::DirWorkspace::single(self.dir.path()))
    }
}

pub fn build_monitor(
    workspace: &TestWorkspace,
    runner: Arc<MockRunner>,
    activity: Arc<MockActivity>,
) -> ConversationMonitor {
    let logger = Arc::new(CliLogger::new(runner, "convlog"));
    ConversationMonitor::new(workspace.locator(), logger, activity)
}
