use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use convlog_core::{
    ActivitySource, ChatMessage, LogError, LogRequest, Role, Subscription, WorkspaceLocator,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::logger::CliLogger;

/// Default inactivity window before a pending buffer is auto-saved.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(5 * 60);

const CONTEXT_SESSION_ENDED: &str = "Session ended";
const CONTEXT_IDLE: &str = "Auto-save after inactivity";
const CONTEXT_MANUAL: &str = "Manual save";

/// What a flush attempt amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Transcript handed off; the CLI reported this log location.
    Saved(PathBuf),
    /// Empty buffer; nothing rendered, nothing invoked.
    NothingToSave,
    /// No workspace root resolvable; nowhere to log to.
    NoWorkspace,
}

struct MonitorState {
    buffer: Vec<ChatMessage>,
    monitoring: bool,
    session_start: Option<Instant>,
    /// At most one outstanding idle task; replaced on every activity signal.
    idle_timer: Option<JoinHandle<()>>,
    subscriptions: Vec<Subscription>,
    runtime: Option<Handle>,
}

/// Buffers chat turns and guarantees they reach the external logger even if
/// the user never explicitly saves.
///
/// Cheap to clone; clones share state. All operations expect to run inside
/// a tokio runtime so idle tasks can be spawned.
#[derive(Clone)]
pub struct ConversationMonitor {
    state: Arc<Mutex<MonitorState>>,
    workspace: Arc<dyn WorkspaceLocator>,
    logger: Arc<CliLogger>,
    activity: Arc<dyn ActivitySource>,
    idle_threshold: Duration,
}

impl ConversationMonitor {
    pub fn new(
        workspace: Arc<dyn WorkspaceLocator>,
        logger: Arc<CliLogger>,
        activity: Arc<dyn ActivitySource>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(MonitorState {
                buffer: Vec::new(),
                monitoring: false,
                session_start: None,
                idle_timer: None,
                subscriptions: Vec::new(),
                runtime: None,
            })),
            workspace,
            logger,
            activity,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
        }
    }

    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    /// Begin monitoring. No-op when already active or when the workspace
    /// config is missing or has auto-log disabled. Idempotent: calling
    /// twice registers no duplicate listeners.
    pub fn start_monitoring(&self) {
        let mut state = self.lock();
        if state.monitoring {
            return;
        }

        let Some(config) = self.workspace.config() else {
            debug!("no workspace config, not starting monitor");
            return;
        };
        if !config.auto_log {
            debug!("auto-log disabled, not starting monitor");
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime available, not starting monitor");
            return;
        };

        state.monitoring = true;
        state.session_start = Some(Instant::now());
        state.runtime = Some(runtime);

        let on_file = self.clone();
        let file_sub = self
            .activity
            .on_file_activity(Arc::new(move || on_file.notify_activity()));
        let on_doc = self.clone();
        let doc_sub = self
            .activity
            .on_document_activity(Arc::new(move || on_doc.notify_activity()));
        state.subscriptions.push(file_sub);
        state.subscriptions.push(doc_sub);

        info!("conversation monitoring started");
    }

    /// Stop monitoring. A non-empty buffer is flushed first, tagged as the
    /// session's end; failures there are logged, never raised, so stopping
    /// always completes. Releases all listener subscriptions and cancels
    /// the idle timer.
    pub async fn stop_monitoring(&self) {
        {
            let state = self.lock();
            if !state.monitoring {
                return;
            }
        }

        if self.buffer_size() > 0 {
            match self.flush(CONTEXT_SESSION_ENDED).await {
                Ok(SaveOutcome::Saved(path)) => {
                    info!(path = %path.display(), "session flushed on stop");
                }
                Ok(_) => {}
                Err(err) => warn!("final flush failed, keeping buffer: {err}"),
            }
        }

        let mut state = self.lock();
        if let Some(timer) = state.idle_timer.take() {
            timer.abort();
        }
        state.subscriptions.clear();
        state.monitoring = false;
        state.session_start = None;

        info!("conversation monitoring stopped");
    }

    /// Record one chat turn. Turns seen while inactive are dropped, not
    /// queued. Every append resets the idle timer.
    pub fn add_message(&self, role: Role, content: impl Into<String>) {
        let mut state = self.lock();
        if !state.monitoring {
            return;
        }

        state.buffer.push(ChatMessage::new(role, content));
        debug!(buffered = state.buffer.len(), "message recorded");
        self.reset_idle_timer(&mut state);
    }

    /// Record several chat turns at once.
    pub fn add_messages(&self, messages: Vec<ChatMessage>) {
        let mut state = self.lock();
        if !state.monitoring {
            return;
        }

        state.buffer.extend(messages);
        debug!(buffered = state.buffer.len(), "messages recorded");
        self.reset_idle_timer(&mut state);
    }

    /// Flush the buffer immediately. An empty buffer short-circuits to
    /// [`SaveOutcome::NothingToSave`] without touching anything. Unlike the
    /// automatic triggers, failures here are returned to the caller.
    pub async fn save_now(&self, context: Option<&str>) -> Result<SaveOutcome, LogError> {
        if self.buffer_size() == 0 {
            debug!("no messages to save");
            return Ok(SaveOutcome::NothingToSave);
        }
        self.flush(context.unwrap_or(CONTEXT_MANUAL)).await
    }

    pub fn buffer_size(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_active(&self) -> bool {
        self.lock().monitoring
    }

    /// Time since the session started or since the last successful flush;
    /// zero when never started.
    pub fn session_duration(&self) -> Duration {
        self.lock()
            .session_start
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    /// Activity signal from the host. Resets the idle timer while active.
    fn notify_activity(&self) {
        let mut state = self.lock();
        if !state.monitoring {
            return;
        }
        self.reset_idle_timer(&mut state);
    }

    fn reset_idle_timer(&self, state: &mut MonitorState) {
        if let Some(timer) = state.idle_timer.take() {
            timer.abort();
        }
        let Some(runtime) = state.runtime.clone() else {
            return;
        };

        let monitor = self.clone();
        let threshold = self.idle_threshold;
        state.idle_timer = Some(runtime.spawn(async move {
            tokio::time::sleep(threshold).await;
            monitor.on_idle().await;
        }));
    }

    /// Idle threshold reached. Flushes a pending buffer; stays dormant
    /// afterwards until the next activity re-arms the timer.
    async fn on_idle(&self) {
        if self.buffer_size() == 0 {
            return;
        }

        debug!("inactivity threshold reached, saving conversation");
        match self.flush(CONTEXT_IDLE).await {
            Ok(SaveOutcome::Saved(path)) => {
                info!(path = %path.display(), "conversation auto-saved after inactivity");
            }
            Ok(_) => {}
            Err(err) => warn!("auto-save after inactivity failed: {err}"),
        }
    }

    /// Shared flush path for idle, manual, and session-end triggers.
    ///
    /// The buffer is snapshotted under the lock and the lock is not held
    /// across the external invocation: turns recorded mid-flush land in the
    /// live buffer and survive. Only the flushed prefix is removed, and
    /// only after confirmed success.
    async fn flush(&self, context: &str) -> Result<SaveOutcome, LogError> {
        let Some(root) = self.workspace.workspace_root() else {
            debug!("no workspace root, nowhere to log to");
            return Ok(SaveOutcome::NoWorkspace);
        };

        let snapshot = {
            let state = self.lock();
            if state.buffer.is_empty() {
                return Ok(SaveOutcome::NothingToSave);
            }
            state.buffer.clone()
        };
        let count = snapshot.len();
        debug!(messages = count, context, "flushing conversation buffer");

        let request = LogRequest::new(context, snapshot);
        let path = self.logger.log_conversation(&root, &request).await?;

        let mut state = self.lock();
        let flushed = count.min(state.buffer.len());
        state.buffer.drain(..flushed);
        state.session_start = Some(Instant::now());
        info!(path = %path.display(), messages = count, "conversation logged");

        Ok(SaveOutcome::Saved(path))
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
