pub mod error;
pub mod host;
pub mod message;
pub mod runner;
pub mod transcript;

pub use error::LogError;
pub use host::{
    ActivityListener, ActivitySource, NullActivitySource, Subscription, WorkspaceConfig,
    WorkspaceLocator,
};
pub use message::{ChatMessage, LogRequest, Role};
pub use runner::{CommandOutput, CommandRunner, RunnerError};
