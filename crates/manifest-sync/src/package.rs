use crate::{Error, Result};
use manifest_format::{AppId, SCRIPT_EXTENSION};
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// Outcome of writing an output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    /// Path of the finished archive.
    pub path: PathBuf,
    /// Entry name the script was stored under.
    pub script_entry: String,
    /// Payload entry names, in the order they were added.
    pub payloads: Vec<String>,
    /// Payload paths that no longer existed and were left out.
    pub missing: Vec<PathBuf>,
}

/// Builds the deliverable archive: the rewritten script plus payload files.
#[derive(Debug, Clone)]
pub struct Repackager {
    app_id: AppId,
    script: Option<PathBuf>,
    payloads: Vec<PathBuf>,
    compression: CompressionMethod,
}

impl Repackager {
    /// Create a builder for the archive of `app_id`.
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            script: None,
            payloads: Vec::new(),
            compression: CompressionMethod::Deflated,
        }
    }

    /// Set the rewritten script; it is stored as `<app_id>.lua`.
    pub fn with_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.script = Some(path.into());
        self
    }

    /// Add payload files, stored under their base names.
    pub fn with_payloads<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.payloads.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    /// Entry name used for the script.
    pub fn script_entry_name(&self) -> String {
        format!("{}.{}", self.app_id, SCRIPT_EXTENSION)
    }

    /// Write the archive to `path`, replacing any existing file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<PackageReport> {
        let script = self
            .script
            .as_ref()
            .filter(|script| script.is_file())
            .ok_or_else(|| Error::MissingScript(self.script.clone().unwrap_or_default()))?;

        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".tmp.package-")
            .suffix(".zip")
            .tempfile_in(&parent)?;

        let script_entry = self.script_entry_name();
        let (payloads, missing) = self
            .write_archive(temp.as_file_mut(), script, &script_entry)
            .map_err(|e| Error::Packaging(e.to_string()))?;

        persist_tempfile(temp, path)?;

        Ok(PackageReport {
            path: path.to_path_buf(),
            script_entry,
            payloads,
            missing,
        })
    }

    fn write_archive<W: Write + Seek>(
        &self,
        writer: W,
        script: &Path,
        script_entry: &str,
    ) -> zip::result::ZipResult<(Vec<String>, Vec<PathBuf>)> {
        let mut zip = ZipWriter::new(writer);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(self.compression);

        zip.start_file(script_entry, options)?;
        io::copy(&mut File::open(script)?, &mut zip)?;

        let mut added = Vec::new();
        let mut missing = Vec::new();
        for payload in &self.payloads {
            let Some(entry_name) = payload.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            if added.contains(&entry_name) {
                continue;
            }
            let mut source = match File::open(payload) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::warn!("Payload vanished before packaging: {}", payload.display());
                    missing.push(payload.clone());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            zip.start_file(entry_name.as_str(), options)?;
            io::copy(&mut source, &mut zip)?;
            added.push(entry_name);
        }

        zip.finish()?;
        Ok((added, missing))
    }
}

fn persist_tempfile(temp: NamedTempFile, final_path: &Path) -> Result<()> {
    temp.persist(final_path)
        .map(|_| ())
        .map_err(|err| Error::Packaging(format!("{}: {}", final_path.display(), err.error)))
}

/// `blake3:<hex>` digest of a file's contents.
pub fn compute_content_hash(path: &Path) -> std::result::Result<String, io::Error> {
    let bytes = fs::read(path)?;
    let hash = blake3::hash(&bytes);
    Ok(format!("blake3:{}", hex::encode(hash.as_bytes())))
}
