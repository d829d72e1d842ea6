pub mod logger;
pub mod monitor;
pub mod process;
pub mod watch;
pub mod workspace;

pub use logger::CliLogger;
pub use monitor::{ConversationMonitor, SaveOutcome, DEFAULT_IDLE_THRESHOLD};
pub use process::TokioCommandRunner;
pub use watch::FsActivitySource;
pub use workspace::{DirWorkspace, MARKER_DIR};
