use crate::error::{Result, SnapshotError};
use pocket_protocol::Dataset;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

pub const CSV_EXTENSION: &str = "csv";

/// A candidate snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Resolver bound to one data directory.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    dir: PathBuf,
}

impl SnapshotResolver {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn latest(&self, dataset: Dataset) -> Result<SnapshotFile> {
        latest_snapshot(&self.dir, dataset.prefix())
    }

    /// Latest CSV of any dataset.
    pub fn latest_any(&self) -> Result<SnapshotFile> {
        latest_snapshot(&self.dir, "")
    }

    /// All snapshots for `prefix`, newest first.
    pub fn list(&self, prefix: &str) -> Result<Vec<SnapshotFile>> {
        let mut files = scan(&self.dir, prefix)?;
        files.sort_by(|a, b| by_recency(b, a));
        Ok(files)
    }
}

/// Most recently modified `<prefix>*.csv` file directly inside `dir`.
///
/// Equal modification times resolve to the lexically greatest name.
pub fn latest_snapshot(dir: &Path, prefix: &str) -> Result<SnapshotFile> {
    let latest = scan(dir, prefix)?
        .into_iter()
        .max_by(by_recency)
        .ok_or_else(|| SnapshotError::NotFound {
            prefix: prefix.to_string(),
            dir: dir.to_path_buf(),
        })?;
    log::debug!("Resolved snapshot {} for prefix '{prefix}'", latest.name);
    Ok(latest)
}

fn by_recency(a: &SnapshotFile, b: &SnapshotFile) -> std::cmp::Ordering {
    a.modified
        .cmp(&b.modified)
        .then_with(|| a.name.cmp(&b.name))
}

fn scan(dir: &Path, prefix: &str) -> Result<Vec<SnapshotFile>> {
    let io_err = |source: std::io::Error| SnapshotError::Io {
        dir: dir.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(dir).map_err(io_err)?;
    if !meta.is_dir() {
        return Err(io_err(std::io::Error::other("not a directory")));
    }

    let mut files = Vec::new();
    // Symlinked snapshots resolve to their target's type and mtime.
    let walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true);
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                return Err(io_err(source));
            }
            Err(err) => {
                log::warn!("Failed to read entry: {err}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            log::debug!("Skipping non UTF-8 file name {}", entry.path().display());
            continue;
        };
        if !is_snapshot_name(name, prefix) {
            continue;
        }

        let modified = match entry.metadata().map_err(std::io::Error::from) {
            Ok(meta) => match meta.modified() {
                Ok(modified) => modified,
                Err(err) => {
                    log::warn!("No modification time for {name}: {err}");
                    continue;
                }
            },
            Err(err) => {
                log::warn!("Failed to stat {name}: {err}");
                continue;
            }
        };

        files.push(SnapshotFile {
            name: name.to_string(),
            path: entry.path().to_path_buf(),
            modified,
        });
    }
    Ok(files)
}

fn is_snapshot_name(name: &str, prefix: &str) -> bool {
    if !name.starts_with(prefix) {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}
