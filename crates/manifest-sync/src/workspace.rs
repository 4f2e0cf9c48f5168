use crate::config::ARCHIVE_EXTENSION;
use crate::{Error, Result};
use chrono::Utc;
use manifest_format::AppId;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "lua_manifest_updater";

/// Per-run temporary directory holding the downloaded archive, the
/// extracted payloads, and the rewritten script.
///
/// The directory name combines the process id, a timestamp, and a random
/// suffix, so concurrent runs never share one. It is removed by
/// [`Workspace::close`], or on drop if `close` was never called.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    app_id: AppId,
}

impl Workspace {
    /// Create a fresh workspace for `app_id` under `temp_root`.
    pub fn create(temp_root: &Path, app_id: &AppId) -> Result<Self> {
        fs::create_dir_all(temp_root).map_err(|e| {
            Error::Workspace(format!("cannot create {}: {}", temp_root.display(), e))
        })?;

        let prefix = format!(
            "{}_{}_{}_",
            WORKSPACE_PREFIX,
            std::process::id(),
            Utc::now().timestamp()
        );
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(temp_root)
            .map_err(|e| Error::Workspace(format!("cannot create workspace: {}", e)))?;

        let workspace = Self {
            dir,
            app_id: app_id.clone(),
        };
        fs::create_dir_all(workspace.extract_dir())
            .map_err(|e| Error::Workspace(format!("cannot create extract dir: {}", e)))?;

        log::debug!("Created workspace {}", workspace.path().display());
        Ok(workspace)
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the branch archive is downloaded to.
    pub fn archive_path(&self) -> PathBuf {
        self.path()
            .join(format!("downloaded_{}.{}", self.app_id, ARCHIVE_EXTENSION))
    }

    /// Where payload files are extracted to.
    pub fn extract_dir(&self) -> PathBuf {
        self.path().join(format!("extracted_{}", self.app_id))
    }

    /// Remove the workspace and everything in it.
    pub fn close(self) -> std::io::Result<()> {
        let path = self.path().to_path_buf();
        self.dir.close()?;
        log::debug!("Removed workspace {}", path.display());
        Ok(())
    }
}
