use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use convlog_core::{ActivitySource, NullActivitySource, WorkspaceLocator};
use convlog_monitor::{
    CliLogger, ConversationMonitor, DirWorkspace, FsActivitySource, TokioCommandRunner,
};
use tracing::warn;

mod feed;

#[derive(Parser)]
#[command(
    name = "convlog-watch",
    version,
    about = "Buffers chat turns and auto-logs them through the convlog CLI"
)]
struct Args {
    /// Workspace folder to monitor (must contain a .convlog directory)
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Override the logging CLI command (defaults to the workspace config)
    #[arg(long)]
    cli: Option<String>,

    /// Idle seconds before a pending buffer is auto-saved
    #[arg(long, default_value_t = 300)]
    idle_secs: u64,

    /// Skip the filesystem watcher (stdin feed only)
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let workspace = Arc::new(DirWorkspace::single(args.workspace));
    let Some(root) = workspace.workspace_root() else {
        eprintln!("No .convlog workspace found here.");
        exit(1);
    };

    let config = workspace.config().unwrap_or_default();
    let cli_path = args.cli.unwrap_or(config.cli_path);
    let logger = Arc::new(CliLogger::new(Arc::new(TokioCommandRunner), cli_path));

    if !logger.is_available().await {
        eprintln!("Logging CLI not available; transcripts cannot be saved.");
        exit(1);
    }

    let activity: Arc<dyn ActivitySource> = if args.no_watch {
        Arc::new(NullActivitySource)
    } else {
        match FsActivitySource::new(&root) {
            Ok(source) => Arc::new(source),
            Err(err) => {
                warn!("filesystem watcher unavailable, continuing without: {err}");
                Arc::new(NullActivitySource)
            }
        }
    };

    let monitor = ConversationMonitor::new(workspace, logger, activity)
        .with_idle_threshold(Duration::from_secs(args.idle_secs));
    monitor.start_monitoring();

    if !monitor.is_active() {
        eprintln!("Monitoring not started; enable auto_log in .convlog/config.json.");
        exit(1);
    }

    if let Err(err) = feed::run_feed(monitor).await {
        eprintln!("Error during session: {err}");
        exit(1);
    }
}
