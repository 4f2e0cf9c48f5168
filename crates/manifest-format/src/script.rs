use crate::{extract_app_id, rewrite_references, AppId, Result, Rewrite, VersionMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of Lua manifest scripts, without the leading dot.
pub const SCRIPT_EXTENSION: &str = "lua";

/// A Lua manifest script loaded into memory.
///
/// The file on disk is never modified; rewritten text is written to a
/// separate location with [`ScriptDocument::write_copy`].
#[derive(Debug, Clone)]
pub struct ScriptDocument {
    path: PathBuf,
    text: String,
}

impl ScriptDocument {
    /// Read a script from disk as UTF-8 text.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Create a document from text already in memory.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Path the document was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the source file, falling back to `script.lua`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("script.{}", SCRIPT_EXTENSION))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Extract the `addappid(...)` identifier.
    pub fn app_id(&self) -> Result<AppId> {
        extract_app_id(&self.text)
    }

    /// Rewrite version references against `versions`.
    pub fn rewrite(&self, versions: &VersionMap) -> Rewrite {
        rewrite_references(&self.text, versions)
    }

    /// Write `text` next to other run artifacts in `dir`, named
    /// `temp_<app_id>_<source file name>`.
    pub fn write_copy(&self, dir: &Path, app_id: &AppId, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let copy_path = dir.join(format!("temp_{}_{}", app_id, self.file_name()));
        fs::write(&copy_path, text)?;
        Ok(copy_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_extract() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.lua");
        fs::write(&path, "addappid(1234)\n").unwrap();

        let doc = ScriptDocument::open(&path).unwrap();
        assert_eq!(doc.app_id().unwrap().as_str(), "1234");
        assert_eq!(doc.file_name(), "game.lua");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let result = ScriptDocument::open(dir.path().join("missing.lua"));
        assert!(matches!(result, Err(crate::Error::IoError(_))));
    }

    #[test]
    fn test_write_copy_leaves_original_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.lua");
        let original = "addappid(1)\nsetManifestid(2, \"3\", 0)\n";
        fs::write(&path, original).unwrap();

        let doc = ScriptDocument::open(&path).unwrap();
        let app_id = doc.app_id().unwrap();
        let versions = VersionMap::from_file_names(["2_4.manifest"]);
        let rewrite = doc.rewrite(&versions);

        let work = dir.path().join("work");
        let copy = doc.write_copy(&work, &app_id, &rewrite.text).unwrap();

        assert_eq!(copy, work.join("temp_1_game.lua"));
        assert!(fs::read_to_string(&copy).unwrap().contains("\"4\""));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }
}
