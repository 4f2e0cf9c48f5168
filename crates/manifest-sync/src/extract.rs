use crate::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Copy every entry of `archive_path` whose name ends with `suffix` into
/// `dest_dir`, flattened to its base name.
///
/// Entries with absolute names or `..` anywhere in the name are rejected.
/// Returns the written paths in archive order, without duplicates; an
/// archive with no matching entries yields an empty list.
pub fn extract_payloads(
    archive_path: &Path,
    dest_dir: &Path,
    suffix: &str,
) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| Error::InvalidArchive(format!("{}: {}", archive_path.display(), e)))?;

    fs::create_dir_all(dest_dir)?;

    let mut written: Vec<PathBuf> = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::InvalidArchive(format!("entry {}: {}", i, e)))?;
        let name = entry.name().to_string();

        if entry.is_dir() || !name.ends_with(suffix) {
            continue;
        }
        if !is_safe_entry_name(&name) || entry.enclosed_name().is_none() {
            log::warn!("Skipping unsafe archive entry: {}", name);
            continue;
        }
        let Some(base_name) = base_name(&name) else {
            continue;
        };

        let target = dest_dir.join(base_name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| Error::InvalidArchive(format!("{}: {}", name, e)))?;

        log::debug!("Extracted {} -> {}", name, target.display());
        if !written.contains(&target) {
            written.push(target);
        }
    }

    Ok(written)
}

fn is_safe_entry_name(name: &str) -> bool {
    !(name.starts_with('/') || name.starts_with('\\') || name.contains(".."))
}

fn base_name(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\']).next().filter(|base| !base.is_empty())
}
