use std::path::PathBuf;

use convlog_core::{WorkspaceConfig, WorkspaceLocator};
use tracing::warn;

/// Name of the marker directory identifying an enabled workspace.
pub const MARKER_DIR: &str = ".convlog";

const CONFIG_FILE: &str = "config.json";

/// Locates the workspace by scanning a fixed set of candidate folders for a
/// marker directory. The first hit wins.
#[derive(Debug, Clone)]
pub struct DirWorkspace {
    folders: Vec<PathBuf>,
}

impl DirWorkspace {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self { folders }
    }

    pub fn single(folder: impl Into<PathBuf>) -> Self {
        Self::new(vec![folder.into()])
    }

    /// The marker directory of the active workspace, if any.
    pub fn marker_dir(&self) -> Option<PathBuf> {
        self.workspace_root().map(|root| root.join(MARKER_DIR))
    }

    /// Where the external CLI writes session logs.
    pub fn sessions_dir(&self) -> Option<PathBuf> {
        self.marker_dir().map(|dir| dir.join("sessions"))
    }
}

impl WorkspaceLocator for DirWorkspace {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.folders
            .iter()
            .find(|folder| folder.join(MARKER_DIR).is_dir())
            .cloned()
    }

    fn config(&self) -> Option<WorkspaceConfig> {
        let path = self.marker_dir()?.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(path = %path.display(), "unreadable workspace config: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_directory() {
        let dir = tempfile::tempdir().unwrap();
        let plain = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(MARKER_DIR)).unwrap();

        let ws = DirWorkspace::new(vec![plain.path().to_path_buf(), dir.path().to_path_buf()]);
        assert_eq!(ws.workspace_root().unwrap(), dir.path());
        assert_eq!(ws.sessions_dir().unwrap(), dir.path().join(".convlog/sessions"));
    }

    #[test]
    fn no_marker_means_no_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let ws = DirWorkspace::single(dir.path());
        assert!(ws.workspace_root().is_none());
        assert!(ws.config().is_none());
    }

    #[test]
    fn reads_config_json() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(MARKER_DIR);
        std::fs::create_dir(&marker).unwrap();
        std::fs::write(
            marker.join(CONFIG_FILE),
            r#"{"project": "demo", "auto_log": true}"#,
        )
        .unwrap();

        let ws = DirWorkspace::single(dir.path());
        let config = ws.config().unwrap();
        assert!(config.auto_log);
        assert_eq!(config.project, "demo");
    }

    #[test]
    fn invalid_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(MARKER_DIR);
        std::fs::create_dir(&marker).unwrap();
        std::fs::write(marker.join(CONFIG_FILE), "{not json").unwrap();

        let ws = DirWorkspace::single(dir.path());
        assert!(ws.config().is_none());
    }
}
