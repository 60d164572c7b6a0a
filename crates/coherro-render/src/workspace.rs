// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// An exclusively owned temporary directory, removed when dropped.
///
/// Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh directory named `{prefix}{random}` under `root`.
    pub fn create(root: &Path, prefix: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "created render workspace");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "removed render workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove render workspace"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_created_with_prefix_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path(), "motion-").unwrap();
        let path = ws.path().to_path_buf();
        assert!(path.is_dir());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("motion-")
        );

        std::fs::create_dir_all(ws.join("media/videos")).unwrap();
        std::fs::write(ws.join("media/videos/scene.mp4"), "x").unwrap();
        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn workspaces_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create(root.path(), "motion-").unwrap();
        let b = Workspace::create(root.path(), "motion-").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_root_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        let ws = Workspace::create(&nested, "motion-").unwrap();
        assert!(ws.path().starts_with(&nested));
    }

    #[test]
    #[tracing_test::traced_test]
    fn already_removed_workspace_drops_quietly() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path(), "motion-").unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        drop(ws);
        assert!(!logs_contain("failed to remove render workspace"));
    }
}
